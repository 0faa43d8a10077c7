//! `georag replay` - feed a recorded stream through the assembler
//!
//! Useful for checking how a captured completion body is reassembled
//! under different chunkings and split strategies.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use georag_core::stream::{
    drive, AssemblerStats, ChunkSource, SplitStrategy, StreamAssembler, StreamEvent,
};
use georag_core::Config;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// File containing a raw completion response body
    pub file: PathBuf,

    /// Bytes per simulated transport chunk
    #[arg(long, default_value_t = 64)]
    pub chunk_size: usize,

    /// Print one JSON line per event instead of the assembled text
    #[arg(long)]
    pub events: bool,

    /// Split strategy (defaults to the configured one)
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    BraceBoundary,
    Tokenizer,
}

impl From<StrategyArg> for SplitStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::BraceBoundary => SplitStrategy::BraceBoundary,
            StrategyArg::Tokenizer => SplitStrategy::Tokenizer,
        }
    }
}

pub async fn run(config: &Config, args: ReplayArgs) -> Result<()> {
    let (output, stats) = replay(config, &args).await?;
    print!("{}", output);
    eprintln!(
        "{} bytes, {} lines, {} records, {} skipped",
        stats.bytes_received, stats.lines_processed, stats.records_parsed, stats.fragments_skipped
    );
    Ok(())
}

/// Replay the file and return the rendered output with the assembler's counters
async fn replay(config: &Config, args: &ReplayArgs) -> Result<(String, AssemblerStats)> {
    let data = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let strategy = args
        .strategy
        .map(SplitStrategy::from)
        .unwrap_or(config.stream.split_strategy);
    let mut source = ChunkSource::from_bytes(data, args.chunk_size);
    let mut assembler = StreamAssembler::with_strategy(strategy);
    let mut events: Vec<StreamEvent> = Vec::new();

    drive(
        &mut source,
        &mut assembler,
        &mut events,
        &CancellationToken::new(),
    )
    .await?;

    Ok((render(&events, args.events)?, *assembler.stats()))
}

/// Render events as assembled text or as JSON lines
fn render(events: &[StreamEvent], as_json: bool) -> Result<String> {
    let mut out = String::new();
    if as_json {
        for event in events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
    } else {
        for event in events {
            if let StreamEvent::TextDelta { text } = event {
                out.push_str(text);
            }
        }
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<StreamEvent> {
        vec![
            StreamEvent::SessionAssigned {
                session_id: "s1".to_string(),
            },
            StreamEvent::TextDelta {
                text: "Hi".to_string(),
            },
            StreamEvent::ParseSkipped {
                raw_fragment: "oops".to_string(),
            },
            StreamEvent::TextDelta {
                text: "!".to_string(),
            },
            StreamEvent::Finished,
        ]
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render(&sample(), false).unwrap(), "Hi!\n");
    }

    #[test]
    fn test_render_json_lines() {
        let out = render(&sample(), true).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], r#"{"type":"session_assigned","session_id":"s1"}"#);
        assert_eq!(lines[4], r#"{"type":"finished"}"#);
    }

    #[test]
    fn test_strategy_arg_conversion() {
        assert_eq!(
            SplitStrategy::from(StrategyArg::Tokenizer),
            SplitStrategy::Tokenizer
        );
    }

    #[tokio::test]
    async fn test_replay_missing_file() {
        let args = ReplayArgs {
            file: PathBuf::from("/definitely/not/here.txt"),
            chunk_size: 8,
            events: false,
            strategy: None,
        };
        let err = run(&Config::default(), args).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn test_replay_recorded_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.txt");
        std::fs::write(
            &path,
            "data:{\"text\":\"a}{b\"}\n\ndata:{\"finish\":true}\n\n",
        )
        .unwrap();

        let args = ReplayArgs {
            file: path,
            chunk_size: 3,
            events: true,
            strategy: Some(StrategyArg::Tokenizer),
        };
        let (output, stats) = replay(&Config::default(), &args).await.unwrap();
        assert_eq!(
            output,
            "{\"type\":\"text_delta\",\"text\":\"a}{b\"}\n{\"type\":\"finished\"}\n"
        );
        assert_eq!(stats.records_parsed, 2);
        assert_eq!(stats.fragments_skipped, 0);

        let args = ReplayArgs {
            strategy: Some(StrategyArg::BraceBoundary),
            events: false,
            ..args
        };
        let (output, stats) = replay(&Config::default(), &args).await.unwrap();
        assert_eq!(output, "\n");
        assert_eq!(stats.fragments_skipped, 2);
    }
}
