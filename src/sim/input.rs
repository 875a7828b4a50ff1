use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::core::Category;
use crate::error::{Result, SimError};
use crate::scheduler::Algorithm;

/// One input tuple. The shape decides the input mode:
/// `(arrival, burst)`, `(arrival, burst, category)` or
/// `(arrival, burst, memory_kb)`.
///
/// Deserializes from a 2- or 3-element sequence. A string third element must
/// name a category; an unknown name fails with the `UnknownCategory` message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WorkloadInput {
    Process(f64, f64),
    Mlq(f64, f64, Category),
    Job(f64, f64, f64),
}

impl WorkloadInput {
    pub fn arrival(&self) -> f64 {
        match *self {
            Self::Process(arrival, _) | Self::Mlq(arrival, _, _) | Self::Job(arrival, _, _) => {
                arrival
            }
        }
    }

    pub fn burst(&self) -> f64 {
        match *self {
            Self::Process(_, burst) | Self::Mlq(_, burst, _) | Self::Job(_, burst, _) => burst,
        }
    }

    pub fn category(&self) -> Option<Category> {
        match *self {
            Self::Mlq(_, _, category) => Some(category),
            _ => None,
        }
    }

    pub fn mode(&self) -> InputMode {
        match self {
            Self::Process(..) => InputMode::Standard,
            Self::Mlq(..) => InputMode::Mlq,
            Self::Job(..) => InputMode::Job,
        }
    }
}

impl<'de> Deserialize<'de> for WorkloadInput {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(WorkloadInputVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ThirdField {
    MemoryKb(f64),
    Category(String),
}

struct WorkloadInputVisitor;

impl<'de> Visitor<'de> for WorkloadInputVisitor {
    type Value = WorkloadInput;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an [arrival, burst] pair with an optional category or memory_kb")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let arrival: f64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let burst: f64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;

        let input = match seq.next_element::<ThirdField>()? {
            None => WorkloadInput::Process(arrival, burst),
            Some(ThirdField::MemoryKb(memory_kb)) => WorkloadInput::Job(arrival, burst, memory_kb),
            Some(ThirdField::Category(name)) => {
                let category = name.parse::<Category>().map_err(de::Error::custom)?;
                WorkloadInput::Mlq(arrival, burst, category)
            }
        };

        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(4, &self));
        }
        Ok(input)
    }
}

impl From<(f64, f64)> for WorkloadInput {
    fn from((arrival, burst): (f64, f64)) -> Self {
        Self::Process(arrival, burst)
    }
}

impl From<(f64, f64, Category)> for WorkloadInput {
    fn from((arrival, burst, category): (f64, f64, Category)) -> Self {
        Self::Mlq(arrival, burst, category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Standard,
    Mlq,
    // Memory admission is not modeled, so no discipline accepts jobs
    Job,
}

impl InputMode {
    pub fn algorithms(&self) -> &'static [Algorithm] {
        match self {
            Self::Standard => &[
                Algorithm::Fcfs,
                Algorithm::Spn,
                Algorithm::Hrrn,
                Algorithm::Srtf,
                Algorithm::Rr,
                Algorithm::Mlfq,
            ],
            Self::Mlq => &[Algorithm::Mlq],
            Self::Job => &[],
        }
    }

    pub fn supports(&self, algorithm: Algorithm) -> bool {
        self.algorithms().contains(&algorithm)
    }

    pub fn check(&self, algorithm: Algorithm) -> Result<()> {
        if self.supports(algorithm) {
            return Ok(());
        }
        let available = self
            .algorithms()
            .iter()
            .map(Algorithm::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Err(SimError::IncompatibleAlgorithm {
            algorithm,
            mode: *self,
            available: if available.is_empty() {
                "none".to_string()
            } else {
                available
            },
        })
    }
}

/// Validate the tuple list and detect its mode from the first item.
pub fn validate_inputs(inputs: &[WorkloadInput]) -> Result<InputMode> {
    let first = inputs.first().ok_or(SimError::EmptyInput)?;
    let mode = first.mode();

    for (index, input) in inputs.iter().enumerate() {
        if input.mode() != mode {
            return Err(SimError::MixedInputShapes {
                index,
                expected: mode,
            });
        }

        let (arrival, burst) = (input.arrival(), input.burst());
        if !arrival.is_finite() || !burst.is_finite() {
            return Err(SimError::NonFiniteTime { index });
        }
        if arrival < 0.0 {
            return Err(SimError::NegativeArrival {
                index,
                value: arrival,
            });
        }
        if burst <= 0.0 {
            return Err(SimError::NonPositiveBurst {
                index,
                value: burst,
            });
        }
        if let WorkloadInput::Job(_, _, memory_kb) = *input {
            if !(memory_kb > 0.0) || !memory_kb.is_finite() {
                return Err(SimError::NonPositiveMemory {
                    index,
                    value: memory_kb,
                });
            }
        }
    }

    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_detection() {
        let standard = [WorkloadInput::Process(0.0, 1.0)];
        assert_eq!(validate_inputs(&standard), Ok(InputMode::Standard));

        let mlq = [WorkloadInput::Mlq(0.0, 1.0, Category::Batch)];
        assert_eq!(validate_inputs(&mlq), Ok(InputMode::Mlq));

        let job = [WorkloadInput::Job(0.0, 1.0, 512.0)];
        assert_eq!(validate_inputs(&job), Ok(InputMode::Job));
    }

    #[test]
    fn test_rejections() {
        assert_eq!(validate_inputs(&[]), Err(SimError::EmptyInput));
        assert_eq!(
            validate_inputs(&[
                WorkloadInput::Process(0.0, 1.0),
                WorkloadInput::Mlq(1.0, 1.0, Category::System),
            ]),
            Err(SimError::MixedInputShapes {
                index: 1,
                expected: InputMode::Standard
            })
        );
        assert_eq!(
            validate_inputs(&[WorkloadInput::Process(-1.0, 1.0)]),
            Err(SimError::NegativeArrival {
                index: 0,
                value: -1.0
            })
        );
        assert_eq!(
            validate_inputs(&[WorkloadInput::Process(0.0, 2.0), WorkloadInput::Process(0.0, 0.0)]),
            Err(SimError::NonPositiveBurst {
                index: 1,
                value: 0.0
            })
        );
        assert_eq!(
            validate_inputs(&[WorkloadInput::Job(0.0, 1.0, 0.0)]),
            Err(SimError::NonPositiveMemory {
                index: 0,
                value: 0.0
            })
        );
        assert_eq!(
            validate_inputs(&[WorkloadInput::Process(f64::NAN, 1.0)]),
            Err(SimError::NonFiniteTime { index: 0 })
        );
    }

    #[test]
    fn test_mode_compatibility() {
        assert!(InputMode::Standard.check(Algorithm::Mlfq).is_ok());
        assert!(InputMode::Mlq.check(Algorithm::Mlq).is_ok());
        assert!(matches!(
            InputMode::Standard.check(Algorithm::Mlq),
            Err(SimError::IncompatibleAlgorithm { .. })
        ));
        assert!(matches!(
            InputMode::Mlq.check(Algorithm::Rr),
            Err(SimError::IncompatibleAlgorithm { .. })
        ));
        assert!(InputMode::Job.check(Algorithm::Fcfs).is_err());
    }

    #[test]
    fn test_sequence_deserialization() {
        let inputs: Vec<WorkloadInput> =
            serde_json::from_str(r#"[[0, 4], [1, 3, "Real_Time"], [2, 1, 256]]"#).unwrap();
        assert_eq!(
            inputs,
            vec![
                WorkloadInput::Process(0.0, 4.0),
                WorkloadInput::Mlq(1.0, 3.0, Category::RealTime),
                WorkloadInput::Job(2.0, 1.0, 256.0),
            ]
        );

        let err = serde_json::from_str::<WorkloadInput>(r#"[0, 2, "general"]"#).unwrap_err();
        assert!(err.to_string().contains("unknown category 'general'"));
        assert!(serde_json::from_str::<WorkloadInput>("[0]").is_err());
        assert!(serde_json::from_str::<WorkloadInput>("[0, 1, 2, 3]").is_err());
    }
}
