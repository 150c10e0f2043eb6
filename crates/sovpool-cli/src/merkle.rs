//! # Merkle Subcommands
//!
//! `root`, `prove` and `verify`. A leaf file holds one 64-hex evidence hash
//! per line in admission order; blank lines and `#` comments are skipped.
//!
//! ```bash
//! sovpool root --leaves pool-leaves.txt
//! sovpool prove --leaves pool-leaves.txt --index 2 > proof.json
//! sovpool verify --proof proof.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use sovpool_crypto::{build_inclusion_proof, merkle_root, verify_inclusion_proof, InclusionProof};

/// Arguments for `sovpool root`.
#[derive(Args, Debug)]
pub struct RootArgs {
    /// File of newline-separated leaf hashes.
    #[arg(long)]
    pub leaves: PathBuf,
}

/// Arguments for `sovpool prove`.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// File of newline-separated leaf hashes.
    #[arg(long)]
    pub leaves: PathBuf,

    /// Zero-based position of the leaf to prove.
    #[arg(long)]
    pub index: usize,
}

/// Arguments for `sovpool verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON inclusion proof, as printed by `prove` or served by the API.
    #[arg(long)]
    pub proof: PathBuf,
}

/// Read a leaf file.
pub fn read_leaves(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read leaf file: {}", path.display()))?;
    Ok(parse_leaves(&content))
}

fn parse_leaves(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn run_root(args: &RootArgs) -> Result<u8> {
    let leaves = read_leaves(&args.leaves)?;
    let root = merkle_root(&leaves)
        .with_context(|| format!("cannot compute root over {}", args.leaves.display()))?;
    tracing::debug!(leaf_count = root.leaf_count, "computed merkle root");

    println!("root:       {}", root.root);
    println!("leaf_count: {}", root.leaf_count);
    Ok(0)
}

pub fn run_prove(args: &ProveArgs) -> Result<u8> {
    let leaves = read_leaves(&args.leaves)?;
    let proof = build_inclusion_proof(&leaves, args.index)
        .with_context(|| format!("cannot prove leaf {} of {}", args.index, args.leaves.display()))?;
    println!("{}", serde_json::to_string_pretty(&proof)?);
    Ok(0)
}

/// Exit 0 when the proof verifies, 1 otherwise.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let proof = load_proof(&args.proof)?;
    if verify_inclusion_proof(&proof) {
        println!(
            "OK: leaf {} is at index {} of {} under root {}",
            proof.leaf, proof.leaf_index, proof.leaf_count, proof.root
        );
        Ok(0)
    } else {
        println!("FAILED: proof does not verify against root {}", proof.root);
        Ok(1)
    }
}

/// Load a proof. Extra fields such as `poolIdentifier` are ignored.
pub fn load_proof(path: &Path) -> Result<InclusionProof> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read proof: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse proof JSON: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn leaf(byte: u8) -> String {
        format!("{byte:02x}").repeat(32)
    }

    fn write_leaves(dir: &Path, leaves: &[String]) -> PathBuf {
        let path = dir.join("leaves.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# pool florianopolis-2026-02").unwrap();
        for l in leaves {
            writeln!(file, "{l}").unwrap();
            writeln!(file).unwrap();
        }
        path
    }

    #[test]
    fn parse_leaves_skips_blanks_and_comments() {
        let parsed = parse_leaves("# header\n\n  aa  \n#x\nbb\n");
        assert_eq!(parsed, vec!["aa".to_string(), "bb".to_string()]);
    }

    #[test]
    fn read_leaves_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let leaves = vec![leaf(3), leaf(1), leaf(2)];
        let path = write_leaves(dir.path(), &leaves);
        assert_eq!(read_leaves(&path).unwrap(), leaves);
    }

    #[test]
    fn root_of_valid_file_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_leaves(dir.path(), &[leaf(1), leaf(2), leaf(3)]);
        assert_eq!(run_root(&RootArgs { leaves: path }).unwrap(), 0);
    }

    #[test]
    fn root_of_empty_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_leaves(dir.path(), &[]);
        assert!(run_root(&RootArgs { leaves: path }).is_err());
    }

    #[test]
    fn root_of_missing_file_is_an_error() {
        let args = RootArgs {
            leaves: PathBuf::from("/nonexistent/leaves.txt"),
        };
        assert!(run_root(&args).is_err());
    }

    #[test]
    fn prove_rejects_index_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_leaves(dir.path(), &[leaf(1), leaf(2)]);
        let args = ProveArgs {
            leaves: path,
            index: 2,
        };
        assert!(run_prove(&args).is_err());
    }

    #[test]
    fn verify_exit_code_follows_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let leaves: Vec<String> = (1..=5).map(leaf).collect();
        let proof = build_inclusion_proof(&leaves, 4).unwrap();

        let good = dir.path().join("good.json");
        std::fs::write(&good, serde_json::to_vec(&proof).unwrap()).unwrap();
        assert_eq!(run_verify(&VerifyArgs { proof: good }).unwrap(), 0);

        let mut forged = proof.clone();
        forged.leaf = leaf(9);
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, serde_json::to_vec(&forged).unwrap()).unwrap();
        assert_eq!(run_verify(&VerifyArgs { proof: bad }).unwrap(), 1);
    }

    #[test]
    fn verify_accepts_api_proof_with_pool_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let leaves: Vec<String> = (1..=3).map(leaf).collect();
        let mut doc = serde_json::to_value(build_inclusion_proof(&leaves, 1).unwrap()).unwrap();
        doc["poolIdentifier"] = serde_json::json!("11111111-2222-4333-8444-555555555555");
        let path = dir.path().join("api-proof.json");
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        assert_eq!(run_verify(&VerifyArgs { proof: path }).unwrap(), 0);
    }

    #[test]
    fn verify_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(run_verify(&VerifyArgs { proof: path }).is_err());
    }
}
