//! Canon Ivy 2 session
//!
//! Drives the Ivy 2 state machine: `StartSession` handshake (battery
//! and MTU), status and settings queries, the `PrintReady`
//! announcement and the chunked JPEG transfer with its
//! transfer-complete wait. An idle timer asks the session to
//! disconnect after thirty seconds without traffic.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use zinkprint_core::canon::{Command, Response, StatusReport};
use zinkprint_core::constants::{
    CANON_CHUNK_SIZE, PACKET_SIZE, RECONNECT_DELAY, TRANSFER_TIMEOUT,
};
use zinkprint_core::SessionState;
use zinkprint_transport::Transport;
use zinkprint_types::{DeviceCondition, PrinterConfig, PrinterStatus};

use crate::error::{Error, Result};
use crate::idle::{self, IdleTimer};

pub use zinkprint_core::canon::SettingsReport as CanonSettings;

/// Session with a Canon Ivy 2 printer
///
/// The session exclusively owns its transport. Operations run in
/// strict request/response lockstep; callers serialize externally.
pub struct CanonSession {
    transport: Box<dyn Transport>,
    state: SessionState,
    min_battery: u8,
    command_timeout: Duration,
    chunk_delay: Duration,
    auto_disconnect: Duration,
    battery_percent: u8,
    mtu: u16,
    idle: Option<(IdleTimer, mpsc::UnboundedReceiver<()>)>,
}

impl CanonSession {
    pub fn new(transport: Box<dyn Transport>, config: &PrinterConfig) -> Self {
        Self {
            transport,
            state: SessionState::Disconnected,
            min_battery: config.min_battery,
            command_timeout: config.command_timeout,
            chunk_delay: config.chunk_delay,
            auto_disconnect: config.auto_disconnect,
            battery_percent: 0,
            mtu: 0,
            idle: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Battery percentage from the last handshake or status query
    pub fn battery_percent(&self) -> u8 {
        self.battery_percent
    }

    /// Device-declared MTU from the handshake; informational only
    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    /// Open the transport and arm the idle timer
    pub async fn connect(&mut self) -> Result<()> {
        self.expect_state(&[SessionState::Disconnected], "connect")?;

        self.transport.open().await?;
        self.state = SessionState::Connected;

        if !self.auto_disconnect.is_zero() {
            self.idle = Some(idle::spawn(self.auto_disconnect));
        }

        info!("Connected to {}", self.transport.peer());
        Ok(())
    }

    /// Handshake; caches battery and MTU
    pub async fn start_session(&mut self) -> Result<()> {
        self.service_idle().await;
        self.expect_state(&[SessionState::Connected], "start session")?;

        match self.start_session_inner().await {
            Ok(()) => {
                self.state = SessionState::Initialized;
                self.touch_idle();
                Ok(())
            }
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Query printer status
    pub async fn status(&mut self) -> Result<PrinterStatus> {
        self.service_idle().await;
        self.expect_state(&[SessionState::Initialized], "query status")?;

        match self.status_inner().await {
            Ok(status) => {
                self.touch_idle();
                Ok(status)
            }
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Read accessory settings
    pub async fn settings(&mut self) -> Result<CanonSettings> {
        self.service_idle().await;
        self.expect_state(&[SessionState::Initialized], "query settings")?;

        match self.settings_inner().await {
            Ok(settings) => {
                self.touch_idle();
                Ok(settings)
            }
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Set the auto-power-off timeout; the device accepts 3, 5 or 10 minutes
    pub async fn set_auto_power_off(&mut self, minutes: u8) -> Result<()> {
        if !matches!(minutes, 3 | 5 | 10) {
            return Err(Error::InvalidArgument(
                "auto power off must be 3, 5 or 10 minutes".into(),
            ));
        }

        self.service_idle().await;
        self.expect_state(&[SessionState::Initialized], "change settings")?;

        match self.write_setting(minutes).await {
            Ok(()) => {
                self.touch_idle();
                Ok(())
            }
            Err(e) => {
                self.fail_if_fatal(&e).await;
                Err(e)
            }
        }
    }

    /// Reboot the printer; the connection drops afterwards
    pub async fn reboot(&mut self) -> Result<()> {
        self.service_idle().await;
        self.expect_state(&[SessionState::Initialized], "reboot")?;

        let result = self.round_trip(Command::Reboot).await;

        // The device restarts either way; release the transport
        let _ = self.transport.close().await;
        self.idle = None;
        self.state = SessionState::Disconnected;

        result.map(|_| ())
    }

    /// Print a prepared JPEG (640x1616, rotated; see the image pipeline)
    ///
    /// Transactional: either the device acknowledged the full transfer
    /// or a typed error is returned. A transient transport failure
    /// triggers one reconnect-and-retry.
    pub async fn print(&mut self, jpeg: &[u8]) -> Result<()> {
        self.service_idle().await;
        self.expect_state(&[SessionState::Initialized], "print")?;

        match self.print_once(jpeg).await {
            Ok(()) => {
                self.state = SessionState::Initialized;
                self.touch_idle();
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                warn!("Transient failure during print: {e}; reconnecting");

                if let Err(recover_err) = self.recover().await {
                    self.fail().await;
                    return Err(recover_err);
                }

                match self.print_once(jpeg).await {
                    Ok(()) => {
                        self.state = SessionState::Initialized;
                        self.touch_idle();
                        Ok(())
                    }
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
        self.idle = None;
        if self.state != SessionState::Failed {
            self.state = SessionState::Disconnected;
        }
        Ok(())
    }

    async fn start_session_inner(&mut self) -> Result<()> {
        let response = self.round_trip(Command::StartSession).await?;
        let info = response.session_info();

        self.battery_percent = info.battery_percent;
        self.mtu = info.mtu;

        debug!(
            battery = info.battery_percent,
            mtu = info.mtu,
            "Session started"
        );
        Ok(())
    }

    async fn status_inner(&mut self) -> Result<PrinterStatus> {
        let response = self.round_trip(Command::GetStatus).await?;
        let report = response.status_report();

        self.battery_percent = report.battery_percent;

        let condition = blocking_condition(&report);
        let is_ready = condition.is_none() && report.battery_percent >= self.min_battery;

        Ok(PrinterStatus {
            battery_percent: report.battery_percent,
            is_ready,
            condition,
            cover_open: Some(report.cover_open),
            no_paper: Some(report.no_paper),
            charging: Some(report.usb_powered),
        })
    }

    async fn settings_inner(&mut self) -> Result<CanonSettings> {
        let response = self.round_trip(Command::GetSettings).await?;
        Ok(response.settings_report())
    }

    async fn write_setting(&mut self, minutes: u8) -> Result<()> {
        let response = self.round_trip(Command::SetAutoPowerOff { minutes }).await?;
        if response.error_code() != 0 {
            return Err(Error::Busy);
        }
        Ok(())
    }

    async fn print_once(&mut self, jpeg: &[u8]) -> Result<()> {
        // Readiness gate: mechanical faults first, then battery; the
        // bare error code only ever means Busy and ranks last
        let status = self.status_inner().await?;
        if let Some(condition) = status.condition {
            if condition != DeviceCondition::Busy {
                return Err(Error::from_condition(
                    condition,
                    status.battery_percent,
                    self.min_battery,
                ));
            }
        }
        if status.battery_percent < self.min_battery {
            return Err(Error::BatteryTooLow {
                percent: status.battery_percent,
                required: self.min_battery,
            });
        }
        if let Some(condition) = status.condition {
            return Err(Error::from_condition(
                condition,
                status.battery_percent,
                self.min_battery,
            ));
        }

        // The device expects a settings read before PrintReady; the
        // values are advisory
        self.round_trip(Command::GetSettings).await?;

        let ready = self
            .round_trip(Command::PrintReady {
                image_size: jpeg.len() as u32,
                alternate: false,
            })
            .await?;
        if ready.error_code() != 0 {
            return Err(Error::Busy);
        }

        self.state = SessionState::Printing;
        info!(bytes = jpeg.len(), "Starting image transfer");

        for (i, chunk) in jpeg.chunks(CANON_CHUNK_SIZE).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.chunk_delay).await;
            }
            self.transport.write(chunk).await?;
            trace!(chunk = i, len = chunk.len(), "Sent chunk");
        }

        // The device acknowledges the transfer with one final message
        let mut buf = [0u8; PACKET_SIZE];
        self.transport
            .read_exact(&mut buf, TRANSFER_TIMEOUT)
            .await?;
        let done = Response::parse(&buf).map_err(Error::from)?;
        trace!("Transfer acknowledged: {done:?}");

        info!("Image transfer complete");
        Ok(())
    }

    /// Close, back off, reopen and re-handshake
    async fn recover(&mut self) -> Result<()> {
        self.transport.close().await?;
        tokio::time::sleep(RECONNECT_DELAY).await;

        self.transport.open().await?;
        self.state = SessionState::Connected;

        self.start_session_inner().await?;
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
        response
            .expect_ack(command.opcode())
            .map_err(Error::from)?;
        trace!("<- {response:?}");
        Ok(response)
    }

    /// Process a pending idle-disconnect request, if any
    async fn service_idle(&mut self) {
        let requested = match &mut self.idle {
            Some((_, rx)) => rx.try_recv().is_ok(),
            None => false,
        };

        if requested {
            info!("Idle window elapsed, disconnecting");
            let _ = self.transport.close().await;
            self.idle = None;
            if self.state != SessionState::Failed {
                self.state = SessionState::Disconnected;
            }
        }
    }

    fn touch_idle(&self) {
        if let Some((timer, _)) = &self.idle {
            timer.touch();
        }
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

    async fn fail_if_fatal(&mut self, error: &Error) {
        if matches!(error, Error::Transport(_) | Error::Protocol(_)) {
            self.fail().await;
        }
    }

    async fn fail(&mut self) {
        let _ = self.transport.close().await;
        self.idle = None;
        self.state = SessionState::Failed;
    }
}

/// Queue-flag bits win over the bare error code; a nonzero code with
/// no matching bit maps to Busy
fn blocking_condition(report: &StatusReport) -> Option<DeviceCondition> {
    if report.cover_open {
        Some(DeviceCondition::CoverOpen)
    } else if report.no_paper {
        Some(DeviceCondition::NoPaper)
    } else if report.wrong_smart_sheet {
        Some(DeviceCondition::WrongSmartSheet)
    } else if report.error_code != 0 {
        Some(DeviceCondition::Busy)
    } else {
        None
    }
}
