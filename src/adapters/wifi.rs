//! WiFi station-mode adapter.
//!
//! The light only needs the network for SNTP.  Credentials come from
//! [`LightConfig`](crate::config::LightConfig); an empty SSID means
//! "no network", and the controller runs without wall-clock time.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: [`WifiStation`] drives the ESP-IDF WiFi
//!   driver via `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: only the credential validation is compiled.

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl std::error::Error for ConnectivityError {}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() {
        return Err(ConnectivityError::NoCredentials);
    }
    if ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Station (ESP-IDF only)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::WifiStation;

#[cfg(target_os = "espidf")]
mod esp {
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
    use log::{info, warn};

    use super::{ConnectivityError, validate_password, validate_ssid};

    /// A connected station.  Dropping it tears the connection down.
    pub struct WifiStation {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl WifiStation {
        /// Bring up STA mode and block until the interface has an address.
        pub fn connect(
            modem: Modem,
            sysloop: &EspSystemEventLoop,
            ssid: &str,
            password: &str,
        ) -> Result<Self, ConnectivityError> {
            validate_ssid(ssid)?;
            validate_password(password)?;

            let failed = |stage: &str, e: esp_idf_svc::sys::EspError| {
                warn!("WiFi: {} failed — {}", stage, e);
                ConnectivityError::ConnectionFailed
            };

            let driver = EspWifi::new(modem, sysloop.clone(), None).map_err(|e| failed("driver", e))?;
            let mut wifi =
                BlockingWifi::wrap(driver, sysloop.clone()).map_err(|e| failed("wrap", e))?;

            let config = Configuration::Client(ClientConfiguration {
                ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
                password: password
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method: if password.is_empty() {
                    AuthMethod::None
                } else {
                    AuthMethod::WPA2Personal
                },
                ..Default::default()
            });
            wifi.set_configuration(&config)
                .map_err(|e| failed("configure", e))?;

            info!("WiFi: connecting to '{}'", ssid);
            wifi.start().map_err(|e| failed("start", e))?;
            wifi.connect().map_err(|e| failed("connect", e))?;
            wifi.wait_netif_up().map_err(|e| failed("netif", e))?;
            info!("WiFi: connected");

            Ok(Self { wifi })
        }

        pub fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}
