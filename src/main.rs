use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use nullsmith::telemetry;
use nullsmith::{BaseConfig, PublicSignals, RegistrationError, Registrar, SubmitReceipt};

/// One JSON line of input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Submission {
    group_id: String,
    /// Hex-encoded proof bytes.
    proof: String,
    public_signals: PublicSignals,
}

/// One JSON line of output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Outcome {
    line: usize,
    group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<SubmitReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn process_line(registrar: &Registrar, line: &str) -> Result<SubmitReceipt> {
    let submission: Submission = serde_json::from_str(line).context("malformed submission")?;
    let proof = hex::decode(submission.proof.trim_start_matches("0x"))
        .context("proof is not valid hex")?;

    if let Err(RegistrationError::GroupNotFound(_)) = registrar.group(&submission.group_id).await
    {
        registrar
            .create_group(&submission.group_id, &submission.group_id, "")
            .await?;
    }

    Ok(registrar
        .submit(&submission.group_id, &proof, &submission.public_signals)
        .await?)
}

async fn run<R: AsyncBufRead + Unpin>(registrar: &Registrar, input: R) -> Result<(usize, usize)> {
    let mut lines = input.lines();
    let mut accepted = 0;
    let mut rejected = 0;
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let group_id = serde_json::from_str::<serde_json::Value>(&line)
            .ok()
            .and_then(|v| v.get("groupId").and_then(|g| g.as_str()).map(String::from));

        let outcome = match process_line(registrar, &line).await {
            Ok(receipt) => {
                accepted += 1;
                Outcome {
                    line: line_no,
                    group_id,
                    receipt: Some(receipt),
                    error: None,
                }
            }
            Err(e) => {
                rejected += 1;
                warn!("Line {} rejected: {:#}", line_no, e);
                Outcome {
                    line: line_no,
                    group_id,
                    receipt: None,
                    error: Some(format!("{e:#}")),
                }
            }
        };
        println!("{}", serde_json::to_string(&outcome)?);
    }

    Ok((accepted, rejected))
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    info!("Starting nullsmith");

    let config = BaseConfig::parse();
    info!(
        "Configuration: ledger_path={:?}, snapshot_dir={}, snapshot_batch_size={}",
        config.ledger_path, config.snapshot_dir, config.snapshot_batch_size
    );

    let input = config.input.clone();
    let registrar = Registrar::initialize(config).await?;

    let (accepted, rejected) = match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("open input {path}"))?;
            run(&registrar, BufReader::new(file)).await?
        }
        None => run(&registrar, BufReader::new(tokio::io::stdin())).await?,
    };

    for group in registrar.groups().await {
        info!(
            "Group {}: root={} snapshot={:?}",
            group.id,
            registrar.root(&group.id).await?,
            group.snapshot_id
        );
    }

    registrar.shutdown().await?;
    info!(
        "nullsmith shutdown complete: {} accepted, {} rejected",
        accepted, rejected
    );
    Ok(())
}
