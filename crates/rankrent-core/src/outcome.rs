//! Tagged result of a boundary call that may substitute fallback data.

/// Result of calling an external collaborator.
///
/// `Degraded` carries a usable value that is not what the collaborator would
/// normally have returned (fallback data, or data accompanied by a warning).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The collaborator returned real data.
    Ok(T),
    /// A usable value plus the reason it is degraded.
    Degraded(T, String),
    /// Nothing usable.
    Failed(String),
}

impl<T> Outcome<T> {
    /// The usable value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) | Self::Degraded(value, _) => Some(value),
            Self::Failed(_) => None,
        }
    }

    /// Consume the outcome, keeping the usable value.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Ok(value) | Self::Degraded(value, _) => Some(value),
            Self::Failed(_) => None,
        }
    }

    /// The degradation or failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Degraded(_, reason) | Self::Failed(reason) => Some(reason),
        }
    }

    /// Whether the value came straight from the collaborator.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Whether the value is a substitute.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_exposed_for_ok_and_degraded() {
        assert_eq!(Outcome::Ok(1).value(), Some(&1));
        assert_eq!(Outcome::Degraded(2, "stale".into()).value(), Some(&2));
        assert_eq!(Outcome::<i32>::Failed("down".into()).value(), None);
    }

    #[test]
    fn reason_is_exposed_for_degraded_and_failed() {
        let degraded = Outcome::Degraded(20, "fallback".into());
        assert_eq!(degraded.reason(), Some("fallback"));
        assert!(degraded.is_degraded());
        assert_eq!(Outcome::<i32>::Failed("down".into()).reason(), Some("down"));
        assert!(Outcome::Ok(()).is_ok());
    }
}
