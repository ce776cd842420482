// Consistent exit codes for the flame CLI.
//
//   0  = success
//   1  = general error
//   2  = usage / invalid request
//   10 = service unavailable
//   11 = rejected by the service
//   13 = timeout
//   14 = protocol error

use flame_client::{Fault, FaultKind};

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Unavailable = 10,
    Rejected = 11,
    Timeout = 13,
    Protocol = 14,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(fault) = cause.downcast_ref::<Fault>() {
                return Self::from_fault_kind(fault.kind());
            }
        }
        Self::Error
    }

    pub fn from_fault_kind(kind: FaultKind) -> Self {
        match kind {
            FaultKind::Unavailable => Self::Unavailable,
            FaultKind::Timeout => Self::Timeout,
            FaultKind::Protocol => Self::Protocol,
            FaultKind::Rejected => Self::Rejected,
            FaultKind::InvalidRequest => Self::Usage,
            FaultKind::Cancelled => Self::Error,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Error.code(), 1);
        assert_eq!(ExitCode::Usage.code(), 2);
        assert_eq!(ExitCode::Unavailable.code(), 10);
        assert_eq!(ExitCode::Rejected.code(), 11);
        assert_eq!(ExitCode::Timeout.code(), 13);
        assert_eq!(ExitCode::Protocol.code(), 14);
    }

    #[test]
    fn fault_kinds_map_to_exit_codes() {
        assert_eq!(ExitCode::from_fault_kind(FaultKind::Unavailable), ExitCode::Unavailable);
        assert_eq!(ExitCode::from_fault_kind(FaultKind::Timeout), ExitCode::Timeout);
        assert_eq!(ExitCode::from_fault_kind(FaultKind::Protocol), ExitCode::Protocol);
        assert_eq!(ExitCode::from_fault_kind(FaultKind::Rejected), ExitCode::Rejected);
        assert_eq!(ExitCode::from_fault_kind(FaultKind::InvalidRequest), ExitCode::Usage);
        assert_eq!(ExitCode::from_fault_kind(FaultKind::Cancelled), ExitCode::Error);
    }

    #[test]
    fn from_error_finds_fault_in_chain() {
        let err = Err::<(), _>(Fault::unavailable("connection refused"))
            .context("listing projects")
            .unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::Unavailable);
    }

    #[test]
    fn from_error_generic_is_error() {
        let err = anyhow::anyhow!("something went wrong");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Error);
    }
}
