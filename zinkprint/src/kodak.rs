//! Kodak Step session
//!
//! Drives the Step family state machine: `GetAccessoryInfo` handshake,
//! readiness checks, the `PrintReady` announcement and the raw chunked
//! JPEG transfer. Transient transport failures get one
//! close-wait-reopen recovery before the session is declared failed.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use zinkprint_core::constants::{
    KODAK_CHUNK_SIZE, PACKET_SIZE, POST_INIT_DELAY, POST_PRINT_READY_DELAY, RECONNECT_DELAY,
};
use zinkprint_core::kodak::{Command, DeviceKind, Response, StatusCode};
use zinkprint_core::SessionState;
use zinkprint_transport::Transport;
use zinkprint_types::{DeviceCondition, PrinterConfig, PrinterStatus};

use crate::error::{Error, Result};
use crate::image;

/// Settle time between back-to-back status queries
const INTER_QUERY_DELAY: Duration = Duration::from_millis(100);

/// Kodak settings snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KodakSettings {
    pub auto_power_off_minutes: u8,
    pub print_count: u16,
}

/// Session with a Kodak Step family printer
///
/// The session exclusively owns its transport. Operations run in
/// strict request/response lockstep; callers serialize externally.
pub struct KodakSession {
    transport: Box<dyn Transport>,
    state: SessionState,
    kind: DeviceKind,
    min_battery: u8,
    command_timeout: Duration,
    chunk_delay: Duration,
    battery_percent: u8,
    mac: Option<String>,
    /// NoPaper reported at handshake time; the device answers info
    /// queries without paper, so this is surfaced via status() instead
    /// of failing initialization
    init_condition: Option<DeviceCondition>,
}

impl KodakSession {
    pub fn new(transport: Box<dyn Transport>, config: &PrinterConfig) -> Self {
        let kind = if config.is_slim {
            DeviceKind::Slim
        } else {
            DeviceKind::Standard
        };

        Self {
            transport,
            state: SessionState::Disconnected,
            kind,
            min_battery: config.min_battery,
            command_timeout: config.command_timeout,
            chunk_delay: config.chunk_delay,
            battery_percent: 0,
            mac: None,
            init_condition: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Battery percentage from the last accessory info query
    pub fn battery_percent(&self) -> u8 {
        self.battery_percent
    }

    /// Printer MAC address reported during the handshake
    pub fn mac_address(&self) -> Option<&str> {
        self.mac.as_deref()
    }

    /// Open the transport
    pub async fn connect(&mut self) -> Result<()> {
        self.expect_state(&[SessionState::Disconnected], "connect")?;

        self.transport.open().await?;
        self.state = SessionState::Connected;

        info!("Connected to {}", self.transport.peer());
        Ok(())
    }

    /// Handshake with the printer
    pub async fn initialize(&mut self) -> Result<()> {
        self.expect_state(&[SessionState::Connected], "initialize")?;

        match self.handshake().await {
            Ok(()) => {
                self.state = SessionState::Initialized;
                Ok(())
            }
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Query the printer's readiness
    ///
    /// Battery comes from the last accessory info; charging and paper
    /// state are queried fresh.
    pub async fn status(&mut self) -> Result<PrinterStatus> {
        self.expect_state(&[SessionState::Initialized], "query status")?;

        match self.status_inner().await {
            Ok(status) => Ok(status),
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Query auto-power-off and the lifetime print counter
    pub async fn settings(&mut self) -> Result<KodakSettings> {
        self.expect_state(&[SessionState::Initialized], "query settings")?;

        match self.settings_inner().await {
            Ok(settings) => Ok(settings),
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Print a JPEG
    ///
    /// Transactional: either the device accepted the full image and
    /// began printing, or a typed error is returned with device state
    /// unchanged (the transport may have been closed). A transient
    /// transport failure triggers one reconnect-and-retry.
    pub async fn print(&mut self, jpeg: &[u8], copies: u8) -> Result<()> {
        self.expect_state(&[SessionState::Initialized], "print")?;

        if copies == 0 {
            return Err(Error::InvalidArgument("copies must be at least 1".into()));
        }
        image::validate_kodak_jpeg(jpeg)?;

        match self.print_once(jpeg, copies).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_recoverable() => {
                warn!("Transient failure during print: {e}; reconnecting");

                if let Err(recover_err) = self.recover().await {
                    self.fail().await;
                    return Err(recover_err);
                }

                match self.print_once(jpeg, copies).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        self.fail().await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Close the transport; safe to call repeatedly
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await?;
        if self.state != SessionState::Failed {
            self.state = SessionState::Disconnected;
        }
        Ok(())
    }

    async fn handshake(&mut self) -> Result<()> {
        let response = self
            .round_trip(Command::GetAccessoryInfo { kind: self.kind })
            .await?;
        let status = response.status().map_err(Error::from)?;

        self.battery_percent = response.battery_percent();
        self.mac = Some(response.mac_address());

        self.init_condition = match status {
            StatusCode::Ok => None,
            StatusCode::NoPaper => {
                warn!("No paper at handshake; deferring until print");
                Some(DeviceCondition::NoPaper)
            }
            code => return Err(self.refusal(code)),
        };

        debug!(
            battery = self.battery_percent,
            mac = self.mac.as_deref().unwrap_or(""),
            "Handshake complete"
        );

        tokio::time::sleep(POST_INIT_DELAY).await;
        Ok(())
    }

    async fn status_inner(&mut self) -> Result<PrinterStatus> {
        let charging = self
            .round_trip(Command::GetBatteryLevel)
            .await?
            .is_charging();

        tokio::time::sleep(INTER_QUERY_DELAY).await;

        let page = self.round_trip(Command::GetPageType).await?;
        let page_status = page.status().map_err(Error::from)?;

        if page_status.is_ok() {
            self.init_condition = None;
        }
        let condition = DeviceCondition::try_from(page_status)
            .ok()
            .or(self.init_condition);

        let is_ready = condition.is_none() && self.battery_percent >= self.min_battery;

        Ok(PrinterStatus {
            battery_percent: self.battery_percent,
            is_ready,
            condition,
            cover_open: Some(condition == Some(DeviceCondition::CoverOpen)),
            no_paper: Some(condition == Some(DeviceCondition::NoPaper)),
            charging: Some(charging),
        })
    }

    async fn settings_inner(&mut self) -> Result<KodakSettings> {
        let auto_power_off_minutes = self
            .round_trip(Command::GetAutoPowerOff)
            .await?
            .auto_power_off_minutes();

        tokio::time::sleep(INTER_QUERY_DELAY).await;

        let print_count = self.round_trip(Command::GetPrintCount).await?.print_count();

        Ok(KodakSettings {
            auto_power_off_minutes,
            print_count,
        })
    }

    async fn print_once(&mut self, jpeg: &[u8], copies: u8) -> Result<()> {
        // Battery gate
        let info = self
            .round_trip(Command::GetAccessoryInfo { kind: self.kind })
            .await?;
        self.battery_percent = info.battery_percent();
        if self.battery_percent < self.min_battery {
            return Err(Error::BatteryTooLow {
                percent: self.battery_percent,
                required: self.min_battery,
            });
        }

        // Paper gate; tolerated at handshake, enforced here
        let page = self.round_trip(Command::GetPageType).await?;
        let page_status = page.status().map_err(Error::from)?;
        if !page_status.is_ok() {
            return Err(self.refusal(page_status));
        }
        self.init_condition = None;

        // Announce the transfer
        let ready = self
            .round_trip(Command::PrintReady {
                image_size: jpeg.len() as u32,
                copies,
            })
            .await?;
        let ready_status = ready.status().map_err(Error::from)?;
        if !ready_status.is_ok() {
            return Err(self.refusal(ready_status));
        }

        tokio::time::sleep(POST_PRINT_READY_DELAY).await;

        self.state = SessionState::Printing;
        info!(bytes = jpeg.len(), copies, "Starting image transfer");

        for (i, chunk) in jpeg.chunks(KODAK_CHUNK_SIZE).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.chunk_delay).await;
            }
            self.transport.write(chunk).await?;
            trace!(chunk = i, len = chunk.len(), "Sent chunk");
        }

        self.drain_transfer_ack().await;

        self.state = SessionState::Initialized;
        info!("Image transfer complete");
        Ok(())
    }

    /// Some firmware emits an unsolicited ack after the transfer;
    /// accept and discard it so it cannot shift later responses
    async fn drain_transfer_ack(&mut self) {
        let mut buf = [0u8; PACKET_SIZE];
        if self
            .transport
            .read_exact(&mut buf, Duration::from_millis(200))
            .await
            .is_ok()
        {
            trace!("Discarding post-transfer message: {:02X?}", &buf[..9]);
        }
    }

    /// Close, back off, reopen and re-handshake
    async fn recover(&mut self) -> Result<()> {
        self.transport.close().await?;
        tokio::time::sleep(RECONNECT_DELAY).await;

        self.transport.open().await?;
        self.state = SessionState::Connected;

        self.handshake().await?;
        self.state = SessionState::Initialized;

        info!("Recovered connection to {}", self.transport.peer());
        Ok(())
    }

    async fn round_trip(&mut self, command: Command) -> Result<Response> {
        trace!("-> {command}");
        self.transport.write(&command.encode()).await?;

        let mut buf = [0u8; PACKET_SIZE];
        self.transport
            .read_exact(&mut buf, self.command_timeout)
            .await?;

        let response = Response::parse(&buf).map_err(Error::from)?;
        trace!("<- {response:?}");
        Ok(response)
    }

    fn expect_state(&self, allowed: &[SessionState], operation: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(Error::InvalidState {
            operation,
            state: self.state,
        })
    }

    fn refusal(&self, code: StatusCode) -> Error {
        match DeviceCondition::try_from(code) {
            Ok(condition) => {
                Error::from_condition(condition, self.battery_percent, self.min_battery)
            }
            // Ok is never a refusal
            Err(()) => Error::Busy,
        }
    }

    async fn fail_if_fatal(&mut self, error: &Error) {
        if matches!(error, Error::Transport(_) | Error::Protocol(_)) {
            self.fail().await;
        }
    }

    async fn fail(&mut self) {
        let _ = self.transport.close().await;
        self.state = SessionState::Failed;
    }
}
