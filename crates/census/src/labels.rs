//! Size-label catalog resolution.

use std::future::Future;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::{Label, LabelName, RunWarning, TrackerError};

/// Outcome of looking up one configured label.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelLookup {
    /// The tracker knows the label.
    Found(Label),
    /// The tracker has no label by that name.
    NotFound,
    /// The lookup itself failed (timeout, auth, server error).
    Failed(TrackerError),
}

/// A configured label name paired with its lookup outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelResolution {
    /// The name exactly as configured.
    pub name: LabelName,
    /// What the tracker said about it.
    pub lookup: LabelLookup,
}

impl LabelResolution {
    /// Returns the resolved label, if any.
    pub fn label(&self) -> Option<&Label> {
        match &self.lookup {
            LabelLookup::Found(label) => Some(label),
            _ => None,
        }
    }

    /// Returns the warning this outcome should raise, if any.
    pub fn warning(&self) -> Option<RunWarning> {
        match &self.lookup {
            LabelLookup::Found(label) if label.name != self.name => {
                Some(RunWarning::LabelNameMismatch {
                    configured: self.name.clone(),
                    canonical: label.name.clone(),
                })
            }
            LabelLookup::Found(_) => None,
            LabelLookup::NotFound => Some(RunWarning::LabelNotFound {
                name: self.name.clone(),
            }),
            LabelLookup::Failed(error) => Some(RunWarning::LabelLookupFailed {
                name: self.name.clone(),
                error: error.clone(),
            }),
        }
    }
}

/// Looks up every configured label name.
///
/// Results come back in the order of `names`, one per name. A missing or
/// failing label never stops the others from being resolved. Up to
/// `concurrency` lookups run at once (at least one).
pub async fn resolve_labels<F, Fut>(
    names: &[LabelName],
    concurrency: usize,
    lookup: F,
) -> Vec<LabelResolution>
where
    F: Fn(LabelName) -> Fut,
    Fut: Future<Output = Result<Label, TrackerError>>,
{
    let outcomes: Vec<Result<Label, TrackerError>> = stream::iter(names.iter().cloned())
        .map(&lookup)
        .buffered(concurrency.max(1))
        .collect()
        .await;

    names
        .iter()
        .zip(outcomes)
        .map(|(name, outcome)| {
            let lookup = match outcome {
                Ok(label) => {
                    if label.name != *name {
                        warn!(
                            label = %name,
                            canonical = %label.name,
                            "Size label is spelled differently in the repository"
                        );
                    }
                    debug!(label = %name, id = %label.id, "Resolved size label");
                    LabelLookup::Found(label)
                }
                Err(error) if error.is_not_found() => {
                    warn!(label = %name, "Size label does not exist; its column will stay at zero");
                    LabelLookup::NotFound
                }
                Err(error) => {
                    warn!(label = %name, %error, "Size label lookup failed");
                    LabelLookup::Failed(error)
                }
            };
            LabelResolution {
                name: name.clone(),
                lookup,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LabelId;

    fn name(s: &str) -> LabelName {
        LabelName::new(s).unwrap()
    }

    fn found(id: u64, s: &str) -> LabelLookup {
        LabelLookup::Found(Label {
            id: LabelId::new(id),
            name: name(s),
        })
    }

    async fn fake_lookup(requested: LabelName) -> Result<Label, TrackerError> {
        match requested.as_str() {
            "size:S" => Ok(Label {
                id: LabelId::new(1),
                name: name("size:S"),
            }),
            "size:m" => Ok(Label {
                id: LabelId::new(2),
                name: name("size:M"),
            }),
            "size:L" => Err(TrackerError::Api {
                status: 500,
                message: "boom".into(),
                retry_after_secs: None,
            }),
            other => Err(TrackerError::NotFound {
                resource: format!("label '{other}'"),
            }),
        }
    }

    #[tokio::test]
    async fn test_every_name_gets_an_outcome_in_order() {
        let names = [name("size:S"), name("size:XL"), name("size:L")];

        let resolved = resolve_labels(&names, 3, fake_lookup).await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].lookup, found(1, "size:S"));
        assert_eq!(resolved[1].lookup, LabelLookup::NotFound);
        assert!(matches!(
            resolved[2].lookup,
            LabelLookup::Failed(TrackerError::Api { status: 500, .. })
        ));
        let names_back: Vec<_> = resolved.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names_back, ["size:S", "size:XL", "size:L"]);
    }

    #[tokio::test]
    async fn test_warnings_per_outcome() {
        let names = [name("size:S"), name("size:XL"), name("size:L"), name("size:m")];

        let warnings: Vec<_> = resolve_labels(&names, 1, fake_lookup)
            .await
            .iter()
            .map(LabelResolution::warning)
            .collect();

        assert_eq!(warnings[0], None);
        assert_eq!(
            warnings[1],
            Some(RunWarning::LabelNotFound {
                name: name("size:XL")
            })
        );
        assert!(matches!(
            warnings[2],
            Some(RunWarning::LabelLookupFailed { .. })
        ));
        assert_eq!(
            warnings[3],
            Some(RunWarning::LabelNameMismatch {
                configured: name("size:m"),
                canonical: name("size:M"),
            })
        );
    }

    #[tokio::test]
    async fn test_found_label_is_exposed() {
        let resolved = resolve_labels(&[name("size:S")], 1, fake_lookup).await;
        assert_eq!(resolved[0].label().map(|l| l.id), Some(LabelId::new(1)));

        let missing = resolve_labels(&[name("size:XXL")], 1, fake_lookup).await;
        assert!(missing[0].label().is_none());
    }
}
