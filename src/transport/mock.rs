/*
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright The Asahi Linux Contributors
 */

//! Recording adapter used by the unit tests.

use super::{AdapterSdk, HostAdapter, OperationMode, PullUpState};
use crate::{Error, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    rc::Rc,
    sync::Once,
};

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Keeps log records on the thread that emitted them, so parallel tests
/// only see their own output.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|c| {
            c.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT_LOGGER: Once = Once::new();

/// Runs `f` and returns its result with every record it logged.
pub(crate) fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    INIT_LOGGER.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
    let result = f();
    (result, CAPTURED.with(|c| c.take()))
}

/// Error level messages among captured records.
pub(crate) fn errors(logs: &[(Level, String)]) -> Vec<&str> {
    logs.iter()
        .filter(|(level, _)| *level == Level::Error)
        .map(|(_, msg)| msg.as_str())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Base(u32),
    Mode(u8, OperationMode),
    PullUp(u8, PullUpState),
    Clock(u8, u32),
    Start(u8, u8),
    Write(u8, u8),
    End(u8, bool),
    Read(u8, u8, usize),
    Scan(u8, u8),
    Close,
}

#[derive(Default)]
pub(crate) struct MockState {
    pub calls: Vec<Call>,
    /// Scripted read replies, used when the register has no echoed value.
    pub reads: VecDeque<String>,
    /// Scan replies by wire address; anything missing answers `NG`.
    pub scans: HashMap<u8, String>,
    pub fail_clock: bool,
    registers: HashMap<u8, Vec<u8>>,
    pending: Option<u8>,
    current: Vec<u8>,
}

impl MockState {
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Every byte passed to `write_byte_i2c`, command codes included.
    pub fn written(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(_, b) => Some(*b),
                _ => None,
            })
            .collect()
    }
}

pub(crate) type Shared = Rc<RefCell<MockState>>;

pub(crate) struct MockSdk {
    pub devices: Vec<String>,
    pub list_error: Option<fn() -> Error>,
    pub opened: usize,
    pub state: Shared,
}

impl MockSdk {
    pub fn new() -> Self {
        Self::with_devices(&["/dev/ttyACM0"])
    }

    pub fn with_devices(devices: &[&str]) -> Self {
        Self {
            devices: devices.iter().map(|d| d.to_string()).collect(),
            list_error: None,
            opened: 0,
            state: Rc::default(),
        }
    }

    pub fn state(&self) -> Shared {
        self.state.clone()
    }
}

impl AdapterSdk for MockSdk {
    type Adapter = MockAdapter;

    fn list_available_devices(&mut self) -> Result<Vec<String>> {
        if let Some(err) = self.list_error {
            return Err(err());
        }
        Ok(self.devices.clone())
    }

    fn open(&mut self, _device: &str) -> Result<MockAdapter> {
        self.opened += 1;
        Ok(MockAdapter {
            state: self.state.clone(),
        })
    }
}

pub(crate) struct MockAdapter {
    pub state: Shared,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
        }
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl HostAdapter for MockAdapter {
    fn set_numerical_base(&mut self, base: u32) -> Result<()> {
        self.record(Call::Base(base));
        Ok(())
    }

    fn set_operation_mode(&mut self, port: u8, mode: OperationMode) -> Result<()> {
        self.record(Call::Mode(port, mode));
        Ok(())
    }

    fn set_pull_up_state_i2c(&mut self, port: u8, state: PullUpState) -> Result<()> {
        self.record(Call::PullUp(port, state));
        Ok(())
    }

    fn set_clock_i2c(&mut self, port: u8, hz: u32) -> Result<()> {
        self.record(Call::Clock(port, hz));
        if self.state.borrow().fail_clock {
            return Err(Error::Nak(format!("I2C{port} FREQ {hz}")));
        }
        Ok(())
    }

    fn start_i2c(&mut self, port: u8, address: u8) -> Result<()> {
        self.record(Call::Start(port, address));
        self.state.borrow_mut().current.clear();
        Ok(())
    }

    fn write_byte_i2c(&mut self, port: u8, data: u8) -> Result<()> {
        self.record(Call::Write(port, data));
        self.state.borrow_mut().current.push(data);
        Ok(())
    }

    fn end_i2c(&mut self, port: u8, repeated_start: bool) -> Result<()> {
        self.record(Call::End(port, repeated_start));
        let mut state = self.state.borrow_mut();
        let current = std::mem::take(&mut state.current);
        if repeated_start {
            state.pending = current.first().copied();
        } else if let Some(reg) = state.pending.take() {
            state.registers.insert(reg, current);
        }
        Ok(())
    }

    fn read_bytes_i2c(&mut self, port: u8, address: u8, count: usize) -> Result<String> {
        self.record(Call::Read(port, address, count));
        let mut state = self.state.borrow_mut();
        let pending = state.pending.take();
        let echoed = pending.and_then(|reg| state.registers.get(&reg).cloned());
        if let Some(data) = echoed {
            let tokens: Vec<String> = data.iter().take(count).map(u8::to_string).collect();
            return Ok(format!("-I2C{port} RXD {}", tokens.join(" ")));
        }
        Ok(state.reads.pop_front().unwrap_or_else(|| "-NG".to_string()))
    }

    fn scan_addr_i2c(&mut self, port: u8, address: u8) -> Result<String> {
        self.record(Call::Scan(port, address));
        let state = self.state.borrow();
        Ok(state
            .scans
            .get(&address)
            .cloned()
            .unwrap_or_else(|| format!("-I2C{port} SCAN {address} NG")))
    }

    fn close(&mut self) -> Result<()> {
        self.record(Call::Close);
        Ok(())
    }
}
