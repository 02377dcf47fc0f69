//! Model Load Error Classification
//!
//! Maps a free-form failure message onto a coarse `ModelErrorType` so a
//! presentation layer can suggest remediation ("check your network" vs "try a
//! different model"). Messages often originate outside this system (runtime
//! exceptions inside the compute context), so matching is by substring.
//!
//! Network keywords are checked first: "failed to fetch invalid model" is a
//! network problem, not a file problem.

use crate::models::ModelErrorType;

const NETWORK_KEYWORDS: [&str; 6] = [
    "network",
    "fetch",
    "timeout",
    "connection",
    "cors",
    "failed to fetch",
];

const FILE_KEYWORDS: [&str; 6] = ["corrupt", "invalid", "format", "parse", "decode", "onnx"];

/// Classify a failure message (case-insensitive)
pub fn classify(message: &str) -> ModelErrorType {
    let message = message.to_lowercase();

    if NETWORK_KEYWORDS.iter().any(|kw| message.contains(kw)) {
        return ModelErrorType::Network;
    }

    if FILE_KEYWORDS.iter().any(|kw| message.contains(kw)) {
        return ModelErrorType::File;
    }

    ModelErrorType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_messages() {
        assert_eq!(classify("fetch failed: timeout"), ModelErrorType::Network);
        assert_eq!(classify("CORS policy blocked request"), ModelErrorType::Network);
        assert_eq!(classify("Connection reset by peer"), ModelErrorType::Network);
        assert_eq!(
            classify("Failed to fetch model weights (network)"),
            ModelErrorType::Network
        );
    }

    #[test]
    fn test_file_messages() {
        assert_eq!(classify("invalid onnx format"), ModelErrorType::File);
        assert_eq!(classify("Model file is CORRUPT"), ModelErrorType::File);
        assert_eq!(classify("could not decode tensor"), ModelErrorType::File);
        assert_eq!(classify("JSON parse error"), ModelErrorType::File);
    }

    #[test]
    fn test_unknown_messages() {
        assert_eq!(classify("segfault"), ModelErrorType::Unknown);
        assert_eq!(classify(""), ModelErrorType::Unknown);
    }

    #[test]
    fn test_network_wins_over_file() {
        assert_eq!(
            classify("failed to fetch invalid model"),
            ModelErrorType::Network
        );
        assert_eq!(classify("onnx download timeout"), ModelErrorType::Network);
    }

    #[test]
    fn test_transport_errors_classify_as_network() {
        use crate::compute::ChannelError;

        assert_eq!(
            classify(&ChannelError::timeout(30_000).to_string()),
            ModelErrorType::Network
        );
        assert_eq!(
            classify(&ChannelError::Closed.to_string()),
            ModelErrorType::Network
        );
    }
}
