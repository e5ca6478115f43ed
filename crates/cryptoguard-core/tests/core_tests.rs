use cryptoguard_core::{
    AssetFailure, AssetPath, AssetRecord, ContentDigest, DigestAlgorithm, FailureKind, Manifest,
    ManifestBuilder, ManifestConfig, ManifestOptions, OutputMode, RunOutcome,
};
use chrono::{DateTime, Utc};

fn fixed_time() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

fn sample_manifest() -> Manifest {
    let config = ManifestConfig::builder()
        .root_dir("/srv/out")
        .base_path("/app")
        .output_mode(OutputMode::StaticExport)
        .build()
        .unwrap();

    ManifestBuilder::new(&config)
        .generated_at(fixed_time())
        .assets([
            AssetRecord::new(
                AssetPath::parse("b/c.css").unwrap(),
                ContentDigest::new([0x22; 32]),
                1,
            ),
            AssetRecord::new(
                AssetPath::parse("a.js").unwrap(),
                ContentDigest::new([0x11; 32]),
                1,
            ),
        ])
        .failures([AssetFailure::permission_denied(
            AssetPath::parse("locked.js").unwrap(),
        )])
        .build()
}

#[test]
fn test_manifest_field_order() {
    let json = serde_json::to_string(&sample_manifest()).unwrap();

    let keys = [
        "\"formatVersion\"",
        "\"generatedAt\"",
        "\"digestAlgorithm\"",
        "\"basePath\"",
        "\"outputMode\"",
        "\"assets\"",
        "\"failures\"",
    ];
    let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    assert!(json.contains("\"generatedAt\":\"2023-11-14T22:13:20Z\""));
    assert!(json.contains("\"outputMode\":\"staticExport\""));
    assert!(json.contains("\"digestAlgorithm\":\"blake3\""));
    assert!(json.contains("\"sizeBytes\":1"));
    assert!(json.contains("\"contentType\":\"text/css; charset=utf-8\""));
}

#[test]
fn test_manifest_reads_back() {
    let manifest = sample_manifest();
    let json = serde_json::to_string_pretty(&manifest).unwrap();
    let parsed: Manifest = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, manifest);
}

#[test]
fn test_digest_serializes_as_hex() {
    let json = serde_json::to_string(&ContentDigest::new([0xab; 32])).unwrap();
    assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
}

#[test]
fn test_layered_resolution() {
    let explicit = ManifestOptions::new()
        .with_root_dir("/build/out")
        .with_algorithm(DigestAlgorithm::Sha256);
    let environment = ManifestOptions::new()
        .with_base_path("/docs")
        .with_algorithm(DigestAlgorithm::Blake3);

    let config = explicit.merge(environment).resolve().unwrap();
    assert_eq!(config.root_dir, std::path::PathBuf::from("/build/out"));
    assert_eq!(config.base_path, "/docs");
    assert_eq!(config.algorithm, DigestAlgorithm::Sha256);
}

#[test]
fn test_options_deserialize_from_json() {
    let options: ManifestOptions =
        serde_json::from_str(r#"{"verbose": true, "disabled": false, "outputMode": "staticExport"}"#)
            .unwrap();
    assert_eq!(options.verbose, Some(true));
    assert_eq!(options.disabled, Some(false));
    assert_eq!(options.output_mode, Some(OutputMode::StaticExport));
    assert!(!options.is_disabled());
}

#[test]
fn test_failed_outcome() {
    let outcome = RunOutcome::Failed {
        kind: FailureKind::RootNotFound,
        reason: "Output directory not found: /missing".to_string(),
    };
    assert!(outcome.is_failed());
    assert_eq!(outcome.failure_kind(), Some(FailureKind::RootNotFound));
    assert!(outcome.manifest().is_none());
}
