use std::sync::Arc;

use anyhow::Result;
use setup_sync::{
    CancellationToken, ChannelSink, Feedback, ModelCatalog, RegistryGate, RemoteSource,
    SetupConfig, SetupEvent, SetupOrchestrator, SetupOutcome, SetupReport,
};
use setup_sync_store::{LocalStore, StoreSyncExecutor};

/// Print feedback items to stderr.
pub fn print_feedback(feedback: &[Feedback]) {
    for item in feedback {
        eprintln!("{item}");
    }
}

/// Run setup, printing progress as it arrives. Records the outcome in the
/// store and fails when required modules are missing.
pub async fn run(
    store: Arc<LocalStore>,
    remote: Arc<dyn RemoteSource>,
    catalog: ModelCatalog,
    config: SetupConfig,
) -> Result<()> {
    let account = config.session.as_ref().map(|s| s.account().to_owned());
    println!("Setting up from {}...", remote.label());

    let (sink, mut events) = ChannelSink::channel();
    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let orchestrator = SetupOrchestrator::new(
        Arc::new(catalog),
        Arc::new(StoreSyncExecutor::new(Arc::clone(&store), remote)),
        Arc::new(RegistryGate::new(Arc::clone(&store))),
        Arc::new(sink),
    )
    .with_cancellation(cancel);

    let worker = orchestrator.spawn(config);

    // The channel closes when the worker drops its sink.
    while let Some(event) = events.recv().await {
        let feedback = Feedback::from(&event);
        match event {
            SetupEvent::Progress(_) | SetupEvent::Completed => println!("{feedback}"),
            SetupEvent::DependencyError { .. } => eprintln!("{feedback}"),
        }
    }

    ctrl_c.abort();
    let report = worker
        .await
        .map_err(|e| anyhow::anyhow!("setup worker failed: {e}"))??;

    print_report(&report);

    if let Some(account) = &account
        && let Err(e) = store.record_setup(account, &report.outcome)
    {
        eprintln!("warning: could not record setup outcome: {e}");
    }

    match report.outcome {
        SetupOutcome::Completed => Ok(()),
        SetupOutcome::DependencyFailed(missing) => anyhow::bail!(
            "setup stopped: {} module(s) not installed on server. \
             Install them or re-run with --skip-module-check",
            missing.len()
        ),
    }
}

fn print_report(report: &SetupReport) {
    for tier in &report.tiers {
        print_feedback(&Feedback::for_tier(tier));
    }

    let totals = report.totals();
    println!(
        "Synced {} inserted, {} updated, {} deleted ({} failed).",
        totals.inserted, totals.updated, totals.deleted, totals.failed
    );
}
