use std::{future::Future, time::Duration};

use thiserror::Error;
use tracing::{info, warn, Instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::{
    actions::{resolve_agent, ActionInvoker, ActionOutcome},
    api::{local_session::SessionError, AuthHeaders, Endpoints, LocalSession, ReqwestTransport, TransportError},
    args::{Args, Command},
    catalog::Catalog,
    detection::{Detection, MatchDetector},
    model::{Aggregator, AggregatorConfig, AggregatorError, FrontendData},
    utils::progress_utils::progress_span,
    view
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Aggregator(#[from] AggregatorError),

    #[error("Unknown agent '{0}'")]
    UnknownAgent(String)
}

/// Wires the components together for the command line.
pub struct App {
    local: LocalSession<ReqwestTransport>,
    detector: MatchDetector<ReqwestTransport>,
    aggregator: Aggregator<ReqwestTransport>,
    actions: ActionInvoker<ReqwestTransport>
}

impl App {
    pub async fn new(args: &Args) -> Result<App, AppError> {
        let local = LocalSession::new(ReqwestTransport::insecure()?, args.lockfile_path());
        let remote = ReqwestTransport::new()?;
        let endpoints = Endpoints::new(&args.region, &args.shard);

        let credentials = local.connect().await?;
        let catalog = Catalog::load(&remote, &endpoints, &args.cache_path()).await;
        let config = AggregatorConfig {
            initial_window: args.initial_window,
            page_size: args.page_size,
            update_interval: Duration::from_millis(args.update_interval_ms),
            max_attempts: args.max_attempts
        };

        Ok(App {
            local,
            detector: MatchDetector::new(remote.clone(), endpoints.clone()),
            aggregator: Aggregator::new(
                remote.clone(),
                endpoints.clone(),
                catalog,
                AuthHeaders::new(&credentials),
                config
            ),
            actions: ActionInvoker::new(remote, endpoints)
        })
    }

    /// Credentials are re-read every cycle so a restarted client is picked up.
    pub async fn detect(&self) -> Result<Detection, AppError> {
        let credentials = self.local.connect().await?;
        let detection = self.detector.detect(&credentials).await;
        self.aggregator.set_headers(detection.headers.clone());

        Ok(detection)
    }

    pub async fn refresh(&self) -> Result<(Detection, FrontendData), AppError> {
        let detection = self.detect().await?;
        let players = detection.context.roster.len().max(1) as u64;
        let span = progress_span(players, &detection.context.phase.to_string());

        let observer = |snapshot: &FrontendData| span.pb_set_position(snapshot.len() as u64);
        let snapshot = self
            .aggregator
            .refresh(&detection.context, &observer)
            .instrument(span.clone())
            .await?;

        Ok((detection, snapshot))
    }

    pub async fn load_more(&self, pages: u32) -> Result<FrontendData, AppError> {
        let mut snapshot = FrontendData::new();
        for page in 1..=pages {
            info!(page, pages, "loading more history");
            snapshot = self.aggregator.load_more(&|_: &FrontendData| {}).await?;
        }

        Ok(snapshot)
    }

    async fn act(&self, command: &Command) -> Result<ActionOutcome, AppError> {
        let detection = self.detect().await?;
        let (context, headers) = (&detection.context, &detection.headers);

        let outcome = match command {
            Command::Dodge => self.actions.dodge(context, headers).await?,
            Command::Select { agent } => {
                let agent_id = self.agent_id(agent)?;
                self.actions.select_agent(context, headers, &agent_id).await?
            }
            Command::Lock { agent } => {
                let agent_id = self.agent_id(agent)?;
                self.actions.instalock(context, headers, &agent_id).await?
            }
            _ => ActionOutcome::Skipped
        };

        Ok(outcome)
    }

    fn agent_id(&self, agent: &str) -> Result<String, AppError> {
        resolve_agent(self.aggregator.catalog(), agent).ok_or_else(|| AppError::UnknownAgent(agent.to_owned()))
    }
}

fn print(detection: &Detection, snapshot: &FrontendData) {
    println!(
        "{}",
        view::render(snapshot, &detection.context.game_info(), chrono::Local::now())
    );

    let loadouts = view::render_loadouts(snapshot);
    if !loadouts.is_empty() {
        println!("\n{loadouts}");
    }
}

/// Runs `cycle` once per `period` until `shutdown` resolves. A cycle still in
/// flight at shutdown is dropped.
async fn run_every<F, Fut>(period: Duration, shutdown: impl Future<Output = ()>, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>
{
    let mut ticker = tokio::time::interval(period);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = async {
                ticker.tick().await;
                cycle().await;
            } => {}
        }
    }
}

pub async fn run(args: Args) -> Result<(), AppError> {
    let app = App::new(&args).await?;

    match args.command.clone().unwrap_or(Command::Refresh) {
        Command::Refresh => {
            let (detection, snapshot) = app.refresh().await?;
            print(&detection, &snapshot);
        }
        Command::Watch { interval } => {
            let app = &app;
            let interrupted = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "cannot listen for ctrl-c");
                    std::future::pending::<()>().await;
                }
                info!("interrupted, stopping");
            };
            run_every(Duration::from_secs(interval.max(1)), interrupted, move || async move {
                match app.refresh().await {
                    Ok((detection, snapshot)) => print(&detection, &snapshot),
                    Err(e) => warn!(error = %e, "refresh failed")
                }
            })
            .await;
        }
        Command::LoadMore { pages } => {
            let (detection, _) = app.refresh().await?;
            let snapshot = app.load_more(pages).await?;
            print(&detection, &snapshot);
        }
        command => match app.act(&command).await? {
            ActionOutcome::Sent { status } => info!(status, "action completed"),
            ActionOutcome::Skipped => warn!("action skipped, not in a match")
        }
    }

    Ok(())
}
