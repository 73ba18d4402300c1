//! Voice-print store commands.

use clap::Args;
use serde::Serialize;
use voicegate::voiceprint::VoicePrint;
use voicegate::Config;

use super::{open_prints, output_result, print_success, print_verbose, print_warning, read_json};
use crate::Cli;

/// Enroll a user. The input holds a JSON array of embeddings
/// (`[[0.1, ...], [0.2, ...]]`); their mean becomes the voice print.
#[derive(Args)]
pub struct EnrollCommand {
    /// User id
    user_id: String,
    /// JSON file with the enrollment embeddings, or - for stdin
    input: String,
}

/// Verify a probe embedding (`[0.1, ...]`) against one user.
#[derive(Args)]
pub struct VerifyCommand {
    /// Claimed user id
    user_id: String,
    /// JSON file with the probe embedding, or - for stdin
    input: String,
}

/// Identify the closest enrolled user for a probe embedding.
#[derive(Args)]
pub struct IdentifyCommand {
    /// JSON file with the probe embedding, or - for stdin
    input: String,
}

/// Blend a new embedding into an existing print.
#[derive(Args)]
pub struct UpdateCommand {
    /// User id
    user_id: String,
    /// JSON file with the new embedding, or - for stdin
    input: String,
    /// Weight of the new sample in [0, 1] (default: configured update_weight)
    #[arg(long)]
    weight: Option<f32>,
}

#[derive(Args)]
pub struct DeleteCommand {
    /// User id
    user_id: String,
}

#[derive(Args)]
pub struct ListCommand {}

/// A voice print as shown to operators: never the raw embedding.
#[derive(Serialize)]
struct PrintSummary {
    user_id: String,
    dimension: usize,
    fingerprint: String,
    created_at: String,
    updated_at: String,
}

impl From<&VoicePrint> for PrintSummary {
    fn from(vp: &VoicePrint) -> Self {
        Self {
            user_id: vp.user_id.clone(),
            dimension: vp.dimension(),
            fingerprint: vp.fingerprint(),
            created_at: vp.created_at.to_rfc3339(),
            updated_at: vp.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct IdentifyOutput {
    matched: bool,
    user_id: Option<String>,
    score: Option<f32>,
}

#[derive(Serialize)]
struct DeleteOutput {
    user_id: String,
    deleted: bool,
}

impl EnrollCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let samples: Vec<Vec<f32>> = read_json(&self.input)?;
        print_verbose(cli, &format!("Read {} sample(s)", samples.len()));
        let prints = open_prints(cli, cfg)?;
        let vp = prints.enroll(&self.user_id, &samples)?;
        print_success(&format!("Enrolled {}", self.user_id));
        output_result(&PrintSummary::from(&vp), cli.json)
    }
}

impl VerifyCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let probe: Vec<f32> = read_json(&self.input)?;
        let prints = open_prints(cli, cfg)?;
        let v = prints.verify(&self.user_id, &probe)?;
        if v.accepted {
            print_success(&format!("Accepted as {}", self.user_id));
        } else {
            print_warning(&format!("Rejected: score {:.4} below {:.4}", v.score, v.threshold));
        }
        output_result(&v, cli.json)
    }
}

impl IdentifyCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let probe: Vec<f32> = read_json(&self.input)?;
        let prints = open_prints(cli, cfg)?;
        let out = match prints.identify(&probe)? {
            Some(m) => {
                print_success(&format!("Identified {}", m.user_id));
                IdentifyOutput {
                    matched: true,
                    user_id: Some(m.user_id),
                    score: Some(m.score),
                }
            }
            None => {
                print_warning("No enrolled user matched");
                IdentifyOutput {
                    matched: false,
                    user_id: None,
                    score: None,
                }
            }
        };
        output_result(&out, cli.json)
    }
}

impl UpdateCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let sample: Vec<f32> = read_json(&self.input)?;
        let prints = open_prints(cli, cfg)?;
        let vp = match self.weight {
            Some(w) => prints.adaptive_update_with(&self.user_id, &sample, w)?,
            None => prints.adaptive_update(&self.user_id, &sample)?,
        };
        print_success(&format!("Updated {}", self.user_id));
        output_result(&PrintSummary::from(&vp), cli.json)
    }
}

impl DeleteCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let prints = open_prints(cli, cfg)?;
        let deleted = prints.delete(&self.user_id)?;
        if deleted {
            print_success(&format!("Deleted {}", self.user_id));
        } else {
            print_warning(&format!("{} was not enrolled", self.user_id));
        }
        output_result(
            &DeleteOutput {
                user_id: self.user_id.clone(),
                deleted,
            },
            cli.json,
        )
    }
}

impl ListCommand {
    pub fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let prints = open_prints(cli, cfg)?;
        let all: Vec<PrintSummary> = prints.list()?.iter().map(PrintSummary::from).collect();
        print_verbose(cli, &format!("{} enrolled user(s)", all.len()));
        output_result(&all, cli.json)
    }
}
