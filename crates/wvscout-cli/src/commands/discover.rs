use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use wvscout_config::ScoutConfig;
use wvscout_core::{NATIVE_WIN, ScoutError};
use wvscout_device::contexts::{
    android_package_for_context, assign_contexts, is_chromedriver_context, resolve_context_name,
    select_context,
};
use wvscout_device::{
    AdbBridge, CapabilityOverrides, ContextResolver, DetailsCache, DeviceChannel, DiscoveryOptions,
    DiscoveryReport, HttpProbe, PortAllocator, compose_chromedriver_caps, webview_names,
};

/// One device plus everything discovery needs to talk to it.
struct Session {
    bridge: Arc<AdbBridge>,
    resolver: ContextResolver,
    opts: DiscoveryOptions,
}

impl Session {
    fn new(config: &ScoutConfig) -> wvscout_core::Result<Self> {
        let bridge = Arc::new(AdbBridge::new(&config.device));
        let probe = HttpProbe::new(Duration::from_millis(config.discovery.probe_timeout_ms))?;
        let resolver = ContextResolver::new(
            bridge.clone(),
            Arc::new(probe),
            Arc::new(PortAllocator::from_config(config)),
            Arc::new(DetailsCache::with_capacity(config.discovery.cache_capacity)),
        );
        Ok(Self {
            bridge,
            resolver,
            opts: DiscoveryOptions::from(&config.discovery),
        })
    }

    async fn discover(&self) -> wvscout_core::Result<DiscoveryReport> {
        self.resolver.discover(&self.opts).await
    }

    /// Serial of the targeted device; asks adb when none was configured.
    async fn device_serial(&self) -> wvscout_core::Result<String> {
        if let Some(serial) = self.bridge.device_id() {
            return Ok(serial.to_string());
        }
        let online: Vec<_> = self
            .bridge
            .list_devices()
            .await?
            .into_iter()
            .filter(|d| d.state == "device")
            .collect();
        match online.as_slice() {
            [only] => Ok(only.serial.clone()),
            [] => Err(ScoutError::Adb {
                command: "devices".into(),
                reason: "no device online".into(),
            }),
            _ => Err(ScoutError::Adb {
                command: "devices".into(),
                reason: "more than one device online; pass --serial".into(),
            }),
        }
    }
}

pub(super) async fn cmd_contexts(config: &ScoutConfig, json: bool) -> wvscout_core::Result<()> {
    let session = Session::new(config)?;
    let report = session.discover().await?;
    let contexts = assign_contexts(&webview_names(&report, &session.opts));

    if json {
        println!("{}", serde_json::to_string_pretty(&contexts)?);
    } else {
        for context in &contexts {
            println!("{context}");
        }
    }
    Ok(())
}

pub(super) async fn cmd_webviews(config: &ScoutConfig, json: bool) -> wvscout_core::Result<()> {
    let session = Session::new(config)?;
    let report = session.discover().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.entries.is_empty() {
        println!("No webviews found.");
    }
    for entry in &report.entries {
        let name = entry.webview_name.as_deref().unwrap_or(&entry.webview);
        println!("🌐 {name}");
        println!("   socket:  {}", entry.proc);
        if let Some(ref process) = entry.process {
            match process.id {
                Some(ref pid) => println!("   process: {} (pid {pid})", process.name),
                None => println!("   process: {}", process.name),
            }
        }
        if let Some(ref info) = entry.info {
            if let Some(ref browser) = info.browser {
                println!("   browser: {browser}");
            }
            if let Some(ref pkg) = info.android_package {
                println!("   package: {pkg}");
            }
        }
        match entry.pages {
            Some(ref pages) => {
                println!("   pages:   {}", pages.len());
                for page in pages {
                    println!("     • [{}] {} {}", page.page_type, page.title, page.url);
                }
            }
            None => println!("   pages:   unknown"),
        }
    }
    if !report.degraded.is_empty() {
        println!();
        for d in &report.degraded {
            println!("⚠️  {}: {}", d.proc, d.reason);
        }
    }
    Ok(())
}

pub(super) async fn cmd_caps(
    config: &ScoutConfig,
    context: &str,
    overrides_path: Option<&Path>,
    extract_package: bool,
) -> wvscout_core::Result<()> {
    let mut overrides = match overrides_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                ScoutError::Config(format!("cannot read {}: {e}", path.display()))
            })?;
            serde_json::from_str::<CapabilityOverrides>(&raw)?
        }
        None => CapabilityOverrides::default(),
    };

    let session = Session::new(config)?;
    let context = resolve_context_name(Some(context), None, overrides.app_package.as_deref())?;
    if context == NATIVE_WIN || !is_chromedriver_context(&context) {
        return Err(ScoutError::NoSuchContext(format!(
            "{context} is not a webview context"
        )));
    }

    let report = session.discover().await?;
    let contexts = assign_contexts(&webview_names(&report, &session.opts));
    let context = select_context(&context, &contexts)?;

    // Attach to the app that is already running the webview.
    overrides.chrome_use_running_app.get_or_insert(true);
    if overrides.chrome_android_package.is_none()
        && let Some(pkg) = android_package_for_context(&context, &report.entries, extract_package)
    {
        debug!(%context, package = %pkg, "using android package for context");
        overrides.chrome_android_package = Some(pkg);
    }

    let serial = session.device_serial().await?;
    let details = session.resolver.webview_details(&context);
    let caps = compose_chromedriver_caps(&overrides, &serial, details.as_ref());
    println!("{}", serde_json::to_string_pretty(&caps)?);
    Ok(())
}
