//! # Evidence Subcommand
//!
//! Derives the evidence hash a client would submit for a signature, so an
//! auditor holding the voter's nonce can tie a published leaf back to it.

use anyhow::{Context, Result};
use clap::Args;

use sovpool_core::{ContentId, EvidenceHash, EvidenceNonce, VoterId};

#[derive(Args, Debug)]
pub struct EvidenceArgs {
    /// Voter UUID.
    #[arg(long)]
    pub voter: String,

    /// Target content UUID.
    #[arg(long)]
    pub content: String,

    /// Hex nonce of 16 to 64 bytes. A fresh one is generated when omitted.
    #[arg(long)]
    pub nonce: Option<String>,
}

/// Parse the inputs and derive `(nonce, evidence_hash)`.
pub fn derive(args: &EvidenceArgs) -> Result<(EvidenceNonce, EvidenceHash)> {
    let voter = VoterId::parse(&args.voter).context("invalid --voter")?;
    let content = ContentId::parse(&args.content).context("invalid --content")?;
    let nonce = match &args.nonce {
        Some(hex) => EvidenceNonce::parse(hex).context("invalid --nonce")?,
        None => EvidenceNonce::generate(),
    };
    let hash = EvidenceHash::derive(&voter, &content, &nonce)?;
    Ok((nonce, hash))
}

pub fn run_evidence(args: &EvidenceArgs) -> Result<u8> {
    let (nonce, hash) = derive(args)?;
    println!("nonce:    {}", nonce.as_str());
    println!("evidence: {hash}");
    Ok(0)
}
