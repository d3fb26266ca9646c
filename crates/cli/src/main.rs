//! Cournot resolver CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse arguments**: `resolve` and `capabilities` subcommands (see
//!    [`args`]). Usage errors exit with status 1.
//! 2. **Wire observability**: configure `tracing-subscriber` on stderr and,
//!    when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OpenTelemetry OTLP
//!    exporter (see [`telemetry`]).
//! 3. **Construct infrastructure**: a credential-bound
//!    [`gateway::GatewayClient`] per invocation, injected into the
//!    [`steps`] sequencer.
//! 4. **Report**: print the result on stdout, or `Error: <message>` on
//!    stderr with status 1. The access code never appears in that message.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use gateway::{Credential, GatewayClient, Redactor};

mod args;
mod output;
mod telemetry;

use args::{Command, RootArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match RootArgs::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let redactor = Redactor::for_secret(args.command.code());

    let telemetry = match telemetry::init(args.log_format) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("Error: {}", redactor.redact(&format!("{err:#}")));
            return ExitCode::FAILURE;
        }
    };

    let result = run(args).await;
    telemetry.shutdown();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", redactor.redact(&err.to_string()));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RootArgs) -> Result<()> {
    let config = args.gateway_config();
    match args.command {
        Command::Resolve(resolve) => {
            let options = resolve.pipeline_options();
            let client = GatewayClient::new(Credential::new(resolve.code), config)?;
            tracing::info!(
                collectors = options.collectors.len(),
                strict = options.strict_mode,
                "starting resolution"
            );
            let report = steps::run_pipeline(&client, &options).await?;
            println!("{}", output::render_report(&report, resolve.json)?.trim_end());
        }
        Command::Capabilities(caps_args) => {
            let client = GatewayClient::new(Credential::new(caps_args.code), config)?;
            let caps = steps::capabilities(&client).await?;
            println!("{}", output::render_capabilities(&caps, caps_args.json)?.trim_end());
        }
    }
    Ok(())
}
