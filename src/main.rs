use std::env;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use wasmgate::backends::factory::build_runtime;
use wasmgate::broker::{ApiBroker, BrokerWorker, HttpResponse, MemoryTaskQueue, Router};
use wasmgate::config::{load_and_validate_config, GatewayConfig, ProjectConfig};
use wasmgate::event::{issue_token, Event, EventDispatcher, EventHeader, EVENT_TYPE_ANY};
use wasmgate::model::{
    AppletView, MemoryAppletStore, MemoryProjectStore, MemoryPublisherStore, ProjectView,
    PublisherView,
};
use wasmgate::services::{
    EnvStore, HostContext, MemoryKvStore, MemoryMetricsSink, MemoryWasmLogStore, OperatorPool,
    RecordingChainClient, RecordingMqttPublisher, SeedSource, SqlStore,
};
use wasmgate::strategy::{InstanceHandler, StrategyResolver, StrategyStore};
use wasmgate::vm::{InstanceRegistry, LifecycleController};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <config.yaml> <payload> [event_type]", args[0]);
        eprintln!("Example: {} configs/demo.yaml '{{\"temp\": 21}}'", args[0]);
        std::process::exit(1);
    }

    let config_file = &args[1];
    let payload = &args[2];
    let event_type: u32 = args
        .get(3)
        .and_then(|t| t.parse().ok())
        .unwrap_or(EVENT_TYPE_ANY);

    let start_time = Instant::now();
    let config = match load_and_validate_config(config_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", config_file, e);
            std::process::exit(1);
        }
    };

    println!("🚀 wasmgate gateway demo");
    println!("📋 Configuration: {}", config_file);

    match run_gateway(&config, payload, event_type).await {
        Ok(()) => println!("⏱️  Total time: {:?}", start_time.elapsed()),
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_gateway(
    config: &GatewayConfig,
    payload: &str,
    event_type: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let projects = Arc::new(MemoryProjectStore::new());
    let publishers = Arc::new(MemoryPublisherStore::new());
    let applets = Arc::new(MemoryAppletStore::new());
    let strategies = Arc::new(StrategyStore::new());
    let registry = Arc::new(InstanceRegistry::new());

    let runtime = build_runtime(&config.runtime)?;
    let controller = LifecycleController::new(registry.clone(), runtime.clone(), applets.clone());

    let queue = Arc::new(MemoryTaskQueue::new());
    let router = Arc::new(Router::new());
    router.mount("/echo", |req| HttpResponse::ok(req.body.clone()));
    let api = Arc::new(ApiBroker::new(queue.clone(), router.clone()));

    let seed = Arc::new(SeedSource::new());
    let cancel = CancellationToken::new();

    // One recording chain client stands in for the per-chain RPC clients.
    let chain = Arc::new(RecordingChainClient::new());
    for chain_cfg in &config.chains {
        tracing::info!(
            chain_id = chain_cfg.chain_id,
            name = %chain_cfg.name,
            endpoint = %chain_cfg.endpoint,
            "chain endpoint configured"
        );
    }

    let mut first_project: Option<ProjectView> = None;
    let mut applet_id = 0u64;

    for (i, project_cfg) in config.projects.iter().enumerate() {
        let project = project_view(i as u64 + 1, project_cfg);
        projects.insert(project.clone());
        if first_project.is_none() {
            first_project = Some(project.clone());
        }

        for (j, publisher) in project_cfg.publishers.iter().enumerate() {
            publishers.insert(
                &project.name,
                PublisherView {
                    publisher_id: j as u64 + 1,
                    project_id: project.project_id,
                    pub_key: publisher.key.clone(),
                    name: publisher.name.clone(),
                },
            );
        }

        let ctx = host_context(
            &project,
            project_cfg,
            api.clone(),
            seed.clone(),
            chain.clone(),
            &cancel,
        )?;

        for applet_cfg in &project_cfg.applets {
            applet_id += 1;
            let wasm_bytes = match std::fs::read(&applet_cfg.module) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!(
                        "⚠️  Skipping applet '{}': cannot read {}: {}",
                        applet_cfg.name, applet_cfg.module, e
                    );
                    continue;
                }
            };
            applets.insert(AppletView {
                applet_id,
                project_id: project.project_id,
                name: applet_cfg.name.clone(),
                wasm_bytes: Arc::new(wasm_bytes),
            });

            let instance_id = controller.deploy(applet_id, ctx.clone())?;
            controller.start(instance_id)?;

            for strategy in &applet_cfg.strategies {
                let event_type = strategy
                    .event_type
                    .resolve()
                    .expect("validated event type");
                strategies.add(InstanceHandler {
                    project_name: project.name.clone(),
                    applet_id,
                    applet_name: applet_cfg.name.clone(),
                    instance_id,
                    handler: strategy.handler.clone(),
                    event_type,
                });
            }
        }
    }

    let dispatcher = Arc::new(EventDispatcher::new(
        projects,
        publishers,
        Arc::new(StrategyResolver::new(strategies)),
        registry.clone(),
    ));

    for _ in 0..config.broker.get_workers() {
        Arc::new(BrokerWorker::new(
            queue.clone(),
            router.clone(),
            dispatcher.clone(),
            config.broker.get_max_attempts(),
            cancel.clone(),
        ))
        .spawn();
    }

    let project = first_project.ok_or("config declares no projects")?;
    println!("🔢 Instances deployed: {}", registry.len());

    let event = Event {
        header: EventHeader {
            event_type,
            pub_id: config.projects[0]
                .publishers
                .first()
                .map(|p| p.key.clone())
                .unwrap_or_default(),
            pub_time: now_unix(),
            token: issue_token(&project),
            event_id: String::new(),
        },
        payload: payload.to_string(),
    };

    let result = dispatcher.on_event(&project.name, &event).await;
    println!("\n📊 Dispatch result:");
    println!("{}", serde_json::to_string_pretty(&result)?);

    cancel.cancel();
    Ok(())
}

fn project_view(project_id: u64, cfg: &ProjectConfig) -> ProjectView {
    ProjectView {
        project_id,
        name: cfg.name.clone(),
        issuer: cfg.issuer.clone(),
        exp_in: cfg.exp_in,
        sign_key: cfg.sign_key.clone(),
        database: cfg.database.clone(),
    }
}

fn host_context(
    project: &ProjectView,
    cfg: &ProjectConfig,
    api: Arc<ApiBroker>,
    seed: Arc<SeedSource>,
    chain: Arc<RecordingChainClient>,
    cancel: &CancellationToken,
) -> Result<HostContext, Box<dyn std::error::Error>> {
    let sql = match &cfg.database {
        Some(name) => Some(Arc::new(SqlStore::open_in_memory(name)?)),
        None => None,
    };

    Ok(HostContext {
        project: project.clone(),
        instance_id: 0,
        env: Arc::new(EnvStore::from_map(cfg.env.clone())),
        kv: Arc::new(MemoryKvStore::new()),
        sql,
        chain: Some(chain),
        operators: Arc::new(OperatorPool::new()),
        mqtt: Some(Arc::new(RecordingMqttPublisher::new())),
        metrics: Arc::new(MemoryMetricsSink::new()),
        wasm_logs: Arc::new(MemoryWasmLogStore::new()),
        api,
        seed,
        cancel: cancel.clone(),
    })
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
