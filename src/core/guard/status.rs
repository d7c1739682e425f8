/*!
 * Exit-Status Payloads
 * Mapping between operation results and non-negative exit statuses
 */

/// A result type that fits in the non-negative half of an exit status
pub trait StatusPayload: Sized {
    /// Encode as a non-negative status
    fn to_status(&self) -> i64;

    /// Decode a non-negative status, `None` if out of range for this type
    fn from_status(status: i64) -> Option<Self>;
}

impl StatusPayload for u64 {
    fn to_status(&self) -> i64 {
        i64::try_from(*self).unwrap_or(i64::MAX)
    }

    fn from_status(status: i64) -> Option<Self> {
        u64::try_from(status).ok()
    }
}

impl StatusPayload for bool {
    fn to_status(&self) -> i64 {
        i64::from(*self)
    }

    fn from_status(status: i64) -> Option<Self> {
        match status {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

/// Unit-returning operations report a synthetic `0`
impl StatusPayload for () {
    fn to_status(&self) -> i64 {
        0
    }

    fn from_status(status: i64) -> Option<Self> {
        (status >= 0).then_some(())
    }
}
