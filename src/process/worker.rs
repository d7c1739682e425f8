/*!
 * Worker Entrypoint
 *
 * Child side of the process-guard protocol:
 *
 * 1. Read `bincode(FsOperation)` from stdin until EOF
 * 2. Run the operation
 * 3. Write `bincode(Result<Output, FsError>)` to stdout and exit 0
 *
 * Operation errors travel inside the response. A non-zero exit means the
 * worker itself could not follow the protocol.
 */

use super::SupervisorError;
use crate::core::limits::{MAX_WORKER_REQUEST_BYTES, WORKER_PROTOCOL_EXIT_CODE};
use crate::fs::ops::FsOperation;
use std::io::{self, Read, Write};
use tracing::{debug, error};

/// Serve a single request from `input`, writing the response to `output`
pub fn serve<R: Read, W: Write>(input: R, mut output: W) -> Result<(), SupervisorError> {
    let mut request_bytes = Vec::new();
    input
        .take(MAX_WORKER_REQUEST_BYTES as u64 + 1)
        .read_to_end(&mut request_bytes)
        .map_err(|e| SupervisorError::Io(format!("reading request: {}", e)))?;

    if request_bytes.len() > MAX_WORKER_REQUEST_BYTES {
        return Err(SupervisorError::Protocol(format!(
            "request exceeds {} bytes",
            MAX_WORKER_REQUEST_BYTES
        )));
    }

    let request: FsOperation = bincode::deserialize(&request_bytes)
        .map_err(|e| SupervisorError::Protocol(format!("decoding request: {}", e)))?;

    debug!(
        operation = request.name(),
        path = %request.path().display(),
        "worker running operation"
    );

    let response = request
        .run_encoded()
        .map_err(|e| SupervisorError::Protocol(format!("encoding response: {}", e)))?;

    output
        .write_all(&response)
        .and_then(|_| output.flush())
        .map_err(|e| SupervisorError::Io(format!("writing response: {}", e)))
}

/// Run the worker on stdin/stdout, returning the process exit code
pub fn run_worker() -> i32 {
    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();

    match serve(stdin, stdout) {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "worker failed");
            WORKER_PROTOCOL_EXIT_CODE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ops::{ExistsCheck, Operation, SizeQuery};
    use crate::fs::types::FsError;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_serve_size_request() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("blob");
        fs::write(&file, vec![7u8; 300]).unwrap();

        let request = bincode::serialize(&SizeQuery::new(&file).to_request()).unwrap();
        let mut response = Vec::new();
        serve(Cursor::new(request), &mut response).unwrap();

        let decoded: Result<u64, FsError> = bincode::deserialize(&response).unwrap();
        assert_eq!(decoded, Ok(300));
    }

    #[test]
    fn test_serve_reports_operation_error_in_band() {
        let dir = TempDir::new().unwrap();
        let request =
            bincode::serialize(&SizeQuery::new(dir.path().join("gone")).to_request()).unwrap();
        let mut response = Vec::new();
        serve(Cursor::new(request), &mut response).unwrap();

        let decoded: Result<u64, FsError> = bincode::deserialize(&response).unwrap();
        assert!(matches!(decoded, Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_serve_exists_request() {
        let request = bincode::serialize(&ExistsCheck::new("/definitely/not/here").to_request())
            .unwrap();
        let mut response = Vec::new();
        serve(Cursor::new(request), &mut response).unwrap();

        let decoded: Result<bool, FsError> = bincode::deserialize(&response).unwrap();
        assert_eq!(decoded, Ok(false));
    }

    #[test]
    fn test_serve_rejects_garbage() {
        let mut response = Vec::new();
        let result = serve(Cursor::new(vec![0xff; 3]), &mut response);
        assert!(matches!(result, Err(SupervisorError::Protocol(_))));
        assert!(response.is_empty());
    }
}
