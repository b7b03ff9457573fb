use wvscout_config::ScoutConfig;
use wvscout_device::AdbBridge;

pub(super) async fn cmd_devices(config: &ScoutConfig, json: bool) -> wvscout_core::Result<()> {
    let bridge = AdbBridge::new(&config.device);
    let devices = bridge.list_devices().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices attached.");
        return Ok(());
    }
    for d in &devices {
        let marker = if config.device.serial.as_deref() == Some(d.serial.as_str()) {
            "▶"
        } else {
            " "
        };
        println!(
            "{marker} {:<24} {:<14} {:<28} Android {}",
            d.serial,
            d.state,
            d.model.as_deref().unwrap_or("-"),
            d.android_version.as_deref().unwrap_or("?"),
        );
    }
    Ok(())
}
