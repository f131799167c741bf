// wire.rs — Interchange encoding between dry-run and predicate assembly
//
// The command and env vectors captured during a dry run travel through
// the calling CI job as opaque strings: base64 (standard alphabet) of a
// JSON array of strings. The encoding must round-trip exactly; the
// decoded vectors are embedded verbatim in the signed predicate.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;

use crate::provenance::error::ProvenanceError;

/// Encode a list of strings as base64(JSON array).
pub fn marshall_list(items: &[String]) -> String {
    let json = serde_json::to_vec(items).expect("string list serialization cannot fail");
    B64.encode(json)
}

/// Decode a base64(JSON array) string list. An empty input decodes to
/// the empty list, not an error.
pub fn unmarshall_list(arg: &str) -> Result<Vec<String>, ProvenanceError> {
    if arg.is_empty() {
        return Ok(Vec::new());
    }

    let bytes = B64
        .decode(arg)
        .map_err(|e| ProvenanceError::InvalidEncoding(format!("base64: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ProvenanceError::InvalidEncoding(format!("json: {e}")))
}
