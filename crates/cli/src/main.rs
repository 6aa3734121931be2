mod cli;
mod logging;
mod sequence;
mod shutdown;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use dof_bridge::Instance;

use crate::cli::Cli;
use crate::sequence::{BUILTIN_ROMS, Step, builtin, fallback, load_script};
use crate::shutdown::{Flow, Pacer, ShutdownController, ShutdownEvent, spawn_ctrl_c_handler};

fn build_plan(cli: &Cli) -> anyhow::Result<Vec<(String, Vec<Step>)>> {
    if let Some(path) = &cli.script {
        let rom = cli
            .rom
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--script requires --rom"))?;
        return Ok(vec![(rom, load_script(path)?)]);
    }

    let roms: Vec<String> = match &cli.rom {
        Some(rom) => vec![rom.clone()],
        None => BUILTIN_ROMS.iter().map(|rom| rom.to_string()).collect(),
    };
    Ok(roms
        .into_iter()
        .map(|rom| {
            let steps = builtin(&rom).unwrap_or_else(|| {
                tracing::warn!("no built-in sequence for {rom:?}; sending a single test pulse");
                fallback()
            });
            (rom, steps)
        })
        .collect())
}

async fn trigger_on_off(
    instance: &Instance,
    cli: &Cli,
    step: &Step,
    pacer: &mut Pacer,
) -> anyhow::Result<Flow> {
    let on = step.on(cli.on());
    let off = step.off(cli.off());

    println!("  {}{:>3}  on  ({} ms)", step.kind, step.number, on.as_millis());
    instance.data_receive(step.tag(), step.number, 1)?;
    let flow = pacer.sleep(on).await;

    println!("  {}{:>3}  off ({} ms)", step.kind, step.number, off.as_millis());
    instance.data_receive(step.tag(), step.number, 0)?;
    if flow != Flow::Continue {
        return Ok(flow);
    }
    Ok(pacer.sleep(off).await)
}

async fn run_rom(
    instance: &Instance,
    cli: &Cli,
    rom: &str,
    steps: &[Step],
    pacer: &mut Pacer,
) -> anyhow::Result<Flow> {
    let rule = "=".repeat(48);
    println!("\n{rule}\n ROM: {rom}\n{rule}");

    instance.init(&cli.table, rom)?;
    let mut flow = pacer.sleep(cli.init_wait()).await;
    for step in steps {
        if flow != Flow::Continue {
            break;
        }
        flow = trigger_on_off(instance, cli, step, pacer).await?;
    }

    if cli.summary {
        let status = instance.status()?;
        println!("{}", serde_json::to_string_pretty(&status)?);
    }
    instance.finish()?;
    Ok(flow)
}

async fn run_plan(
    instance: &Instance,
    cli: &Cli,
    plan: &[(String, Vec<Step>)],
    pacer: &mut Pacer,
) -> anyhow::Result<Flow> {
    for (rom, steps) in plan {
        let flow = run_rom(instance, cli, rom, steps, pacer).await?;
        if flow != Flow::Continue {
            return Ok(flow);
        }
    }
    Ok(Flow::Continue)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing();

    dof_bridge::config::set_log_callback(Some(logging::forward_to_tracing));
    dof_bridge::config::set_log_level(cli.log_level.into());
    if let Some(base_path) = &cli.base_path {
        dof_bridge::config::set_base_path(base_path);
    }

    let plan = build_plan(&cli)?;

    let shutdown = Arc::new(ShutdownController::new());
    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel::<ShutdownEvent>();
    spawn_ctrl_c_handler(shutdown, shutdown_tx);
    let mut pacer = Pacer::new(shutdown_rx);

    let instance = Instance::new();
    let result = run_plan(&instance, &cli, &plan, &mut pacer).await;
    drop(instance);
    dof_bridge::config::set_log_callback(None);
    if result? == Flow::Abort {
        std::process::exit(130);
    }

    println!("\nDone.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_defaults_to_every_builtin_rom() {
        let cli = Cli::parse_args_only(["dof-test"]).unwrap();
        let plan = build_plan(&cli).unwrap();
        let roms: Vec<&str> = plan.iter().map(|(rom, _)| rom.as_str()).collect();
        assert_eq!(roms, BUILTIN_ROMS);
    }

    #[test]
    fn unknown_rom_gets_a_single_pulse() {
        let cli = Cli::parse_args_only(["dof-test", "--rom", "mm_109c"]).unwrap();
        let plan = build_plan(&cli).unwrap();
        assert_eq!(plan, vec![("mm_109c".to_string(), fallback())]);
    }

    #[tokio::test]
    async fn runs_a_rom_end_to_end() {
        let cli = Cli::parse_args_only([
            "dof-test",
            "--rom",
            "afm",
            "--on-ms",
            "0",
            "--off-ms",
            "0",
            "--init-wait-ms",
            "0",
        ])
        .unwrap();
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut pacer = Pacer::new(rx);

        let instance = Instance::new();
        let steps = builtin("afm").unwrap();
        let flow = run_rom(&instance, &cli, "afm", &steps[..3], &mut pacer).await.unwrap();
        assert_eq!(flow, Flow::Continue);

        let status = instance.status().unwrap();
        assert_eq!(status.session, None);
        assert_eq!(status.sessions_started, 1);
    }

    #[tokio::test]
    async fn abort_still_switches_the_current_output_off() {
        let cli = Cli::parse_args_only(["dof-test", "--init-wait-ms", "0"]).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut pacer = Pacer::new(rx);
        tx.send(ShutdownEvent::Immediate).unwrap();

        let instance = Instance::new();
        let handle = instance.handle();
        let plan = build_plan(&cli).unwrap();
        let flow = run_plan(&instance, &cli, &plan, &mut pacer).await.unwrap();
        assert_eq!(flow, Flow::Abort);

        let status = instance.status().unwrap();
        assert_eq!(status.session, None);
        assert_eq!(status.sessions_started, 1);
        assert_eq!(status.active_elements, 0);

        drop(instance);
        assert!(dof_bridge::status(handle).is_err());
    }
}
