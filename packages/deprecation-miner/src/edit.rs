//! Edit requests for a knowledge-editing library.
//!
//! Each fact becomes one `(prompt, ground_truth, target_new)` triple: the
//! question, the deprecated approach the model currently gives, and the
//! replacement it should give after editing. Locality probes are unrelated
//! prompt/answer pairs the edit must leave alone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EditRequestError;
use crate::types::fact::DeprecationFact;

/// Unrelated prompts and the answers they must keep producing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalityProbe {
    pub prompt: Vec<String>,
    pub ground_truth: Vec<String>,
}

impl LocalityProbe {
    pub fn from_pairs<P, A>(pairs: impl IntoIterator<Item = (P, A)>) -> Self
    where
        P: Into<String>,
        A: Into<String>,
    {
        let (prompt, ground_truth) = pairs
            .into_iter()
            .map(|(p, a)| -> (String, String) { (p.into(), a.into()) })
            .unzip();
        Self {
            prompt,
            ground_truth,
        }
    }
}

/// Arguments for one `edit` call, with the editing library's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub prompts: Vec<String>,
    pub ground_truth: Vec<String>,
    pub target_new: Vec<String>,

    /// Subject of each prompt, for locate-then-edit methods
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality_inputs: Option<BTreeMap<String, LocalityProbe>>,

    #[serde(default)]
    pub sequential_edit: bool,
}

impl EditRequest {
    /// One edit per fact, in fact order.
    pub fn from_facts(facts: &[DeprecationFact]) -> Self {
        Self {
            prompts: facts.iter().map(|f| f.question.clone()).collect(),
            ground_truth: facts.iter().map(|f| f.old_approach.clone()).collect(),
            target_new: facts.iter().map(|f| f.new_approach.clone()).collect(),
            subject: facts.iter().map(|f| f.subject.clone()).collect(),
            locality_inputs: None,
            sequential_edit: false,
        }
    }

    /// Add (or replace) a named locality probe.
    pub fn with_locality<P, A>(
        mut self,
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (P, A)>,
    ) -> Self
    where
        P: Into<String>,
        A: Into<String>,
    {
        self.locality_inputs
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), LocalityProbe::from_pairs(pairs));
        self
    }

    /// Merge a set of named probes, e.g. loaded from a file.
    pub fn with_locality_probes(mut self, probes: BTreeMap<String, LocalityProbe>) -> Self {
        if !probes.is_empty() {
            self.locality_inputs
                .get_or_insert_with(BTreeMap::new)
                .extend(probes);
        }
        self
    }

    pub fn with_sequential_edit(mut self, sequential: bool) -> Self {
        self.sequential_edit = sequential;
        self
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Check the request is well formed.
    pub fn validate(&self) -> Result<(), EditRequestError> {
        let (prompts, ground_truth, target_new) =
            (self.prompts.len(), self.ground_truth.len(), self.target_new.len());

        if prompts != ground_truth || prompts != target_new {
            return Err(EditRequestError::Unbalanced {
                prompts,
                ground_truth,
                target_new,
            });
        }
        if prompts == 0 {
            return Err(EditRequestError::Empty);
        }
        if !self.subject.is_empty() && self.subject.len() != prompts {
            return Err(EditRequestError::UnbalancedSubject {
                prompts,
                subject: self.subject.len(),
            });
        }

        for (name, probe) in self.locality_inputs.iter().flatten() {
            if probe.prompt.len() != probe.ground_truth.len() {
                return Err(EditRequestError::UnbalancedLocality {
                    name: name.clone(),
                    prompts: probe.prompt.len(),
                    ground_truth: probe.ground_truth.len(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fact_fixture;

    #[test]
    fn test_one_triple_per_fact_in_order() {
        let facts = vec![fact_fixture("a()"), fact_fixture("b()")];
        let request = EditRequest::from_facts(&facts);

        assert_eq!(request.len(), 2);
        assert_eq!(request.prompts, vec![facts[0].question.clone(), facts[1].question.clone()]);
        assert_eq!(request.ground_truth, vec!["Use a()", "Use b()"]);
        assert_eq!(request.target_new[1], facts[1].new_approach);
        assert_eq!(request.subject, vec!["a()", "b()"]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_locality_serializes_as_named_mapping() {
        let request = EditRequest::from_facts(&[fact_fixture("arr.tostring()")])
            .with_locality(
                "preserved_code",
                [
                    ("What function finds unique values in a NumPy array?", "np.unique"),
                    ("What is the standard function for matrix multiplication in NumPy?", "np.dot"),
                ],
            )
            .with_sequential_edit(true);

        let json = serde_json::to_value(&request).unwrap();
        let probe = &json["locality_inputs"]["preserved_code"];

        assert_eq!(probe["ground_truth"], serde_json::json!(["np.unique", "np.dot"]));
        assert_eq!(probe["prompt"].as_array().unwrap().len(), 2);
        assert_eq!(json["sequential_edit"], true);
    }

    #[test]
    fn test_locality_omitted_when_absent() {
        let json = serde_json::to_value(EditRequest::from_facts(&[fact_fixture("x()")])).unwrap();
        assert!(json.get("locality_inputs").is_none());
        assert_eq!(json["sequential_edit"], false);
    }

    #[test]
    fn test_validate_rejects_malformed_requests() {
        assert_eq!(EditRequest::from_facts(&[]).validate(), Err(EditRequestError::Empty));

        let mut request = EditRequest::from_facts(&[fact_fixture("x()")]);
        request.target_new.push("extra".into());
        assert!(matches!(request.validate(), Err(EditRequestError::Unbalanced { .. })));

        let mut request = EditRequest::from_facts(&[fact_fixture("x()")]);
        request.locality_inputs = Some(BTreeMap::from([(
            "neighbors".to_string(),
            LocalityProbe {
                prompt: vec!["p".into()],
                ground_truth: vec![],
            },
        )]));
        assert!(matches!(
            request.validate(),
            Err(EditRequestError::UnbalancedLocality { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_short_subject_list() {
        let mut request = EditRequest::from_facts(&[fact_fixture("a()"), fact_fixture("b()")]);
        request.subject.pop();

        assert_eq!(
            request.validate(),
            Err(EditRequestError::UnbalancedSubject {
                prompts: 2,
                subject: 1
            })
        );

        request.subject.clear();
        assert!(request.validate().is_ok());
    }
}
