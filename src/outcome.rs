/// The outcome of a test.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Outcome {
    /// The test passed.
    Passed,
    /// The test failed.
    Failed,
}

impl Outcome {
    /// A short label for the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "ok",
            Self::Failed => "FAILED",
        }
    }
}

impl From<bool> for Outcome {
    fn from(passed: bool) -> Self {
        if passed {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

/// The tallied outcomes of a test run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Summary {
    /// The number of tests run.
    pub total: usize,
    /// The number of tests that passed.
    pub passed: usize,
}

impl Summary {
    /// The number of tests that failed.
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    /// Whether every test passed.
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.total += 1;
        if outcome == Outcome::Passed {
            self.passed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, Summary};

    #[test]
    fn outcome_as_str() {
        assert_eq!(Outcome::Passed.as_str(), "ok");
        assert_eq!(Outcome::Failed.as_str(), "FAILED");
    }

    #[test]
    fn outcome_from_bool() {
        assert_eq!(Outcome::from(true), Outcome::Passed);
        assert_eq!(Outcome::from(false), Outcome::Failed);
    }

    #[test]
    fn summary_empty() {
        let summary = Summary::default();

        assert_eq!(summary.failed(), 0);
        assert!(summary.all_passed());
    }

    #[test]
    fn summary_record() {
        let mut summary = Summary::default();

        summary.record(Outcome::Passed);
        summary.record(Outcome::Failed);
        summary.record(Outcome::Passed);

        assert_eq!(
            summary,
            Summary {
                total: 3,
                passed: 2
            }
        );
        assert_eq!(summary.failed(), 1);
        assert!(!summary.all_passed());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn summary_serialize() {
        use serde::Serialize;
        use serde_assert::{Serializer, Token, Tokens};

        let serializer = Serializer::builder().build();

        claims::assert_ok_eq!(
            Summary {
                total: 3,
                passed: 2
            }
            .serialize(&serializer),
            Tokens(vec![
                Token::Struct {
                    name: "Summary",
                    len: 2
                },
                Token::Field("total"),
                Token::U64(3),
                Token::Field("passed"),
                Token::U64(2),
                Token::StructEnd,
            ])
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn outcome_serialize() {
        use serde::Serialize;
        use serde_assert::{Serializer, Token, Tokens};

        let serializer = Serializer::builder().build();

        claims::assert_ok_eq!(
            Outcome::Failed.serialize(&serializer),
            Tokens(vec![Token::UnitVariant {
                name: "Outcome",
                variant_index: 1,
                variant: "Failed"
            }])
        );
    }
}
