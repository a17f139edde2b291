//! Instance-owned publish/subscribe channels modelling the system buses.
//!
//! Dispatch is synchronous: [`Bus::send`] runs every handler registered for the
//! resolved channel before returning, and a handler may itself send on another
//! bus, giving nested depth-first delivery. Subscriptions live exactly as long
//! as the [`Subscription`] handle returned by [`Bus::subscribe`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::MachineError;

/// Physical role of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusKind {
    /// Unidirectional address lines driven by the processor.
    Address,
    /// Bidirectional data lines.
    Data,
    /// Named control strobes such as `READ`.
    ControlSignals,
}

impl BusKind {
    /// Canonical upper-case bus name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Address => "ADDRESS",
            Self::Data => "DATA",
            Self::ControlSignals => "CONTROL_SIGNALS",
        }
    }
}

/// A control signal defined by an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlSignalSpec {
    /// Signal name used on the bus.
    pub name: &'static str,
    /// Pin mnemonic on the processor package.
    pub pin: &'static str,
}

/// Read strobe.
pub const READ: &str = "READ";
/// Write strobe.
pub const WRITE: &str = "WRITE";
/// Memory versus I/O select.
pub const MEMORY_IO: &str = "MEMORY_IO";

/// 8086 control signals.
pub const X86_CONTROL_SIGNALS: [ControlSignalSpec; 3] = [
    ControlSignalSpec {
        name: READ,
        pin: "RD",
    },
    ControlSignalSpec {
        name: WRITE,
        pin: "WR",
    },
    ControlSignalSpec {
        name: MEMORY_IO,
        pin: "IO/M",
    },
];

/// Processor architecture whose signal table validates the control bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Architecture {
    /// Intel 8086 family.
    #[default]
    X86,
}

impl Architecture {
    /// Control signals defined by this architecture.
    #[must_use]
    pub const fn control_signals(self) -> &'static [ControlSignalSpec] {
        match self {
            Self::X86 => &X86_CONTROL_SIGNALS,
        }
    }

    /// Looks up a control signal by name.
    #[must_use]
    pub fn signal(self, name: &str) -> Option<&'static ControlSignalSpec> {
        self.control_signals().iter().find(|spec| spec.name == name)
    }

    /// Canonical architecture name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::X86 => "X86",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Channel resolution strategy of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalPolicy {
    /// Every payload travels on the bus's own channel; signal names are ignored.
    Plain,
    /// Payloads travel on a named signal checked against the architecture table.
    Checked(Architecture),
}

/// Resolved dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    /// The bus's own channel.
    Bus(BusKind),
    /// A named control signal.
    Signal(&'static str),
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(kind) => f.write_str(kind.name()),
            Self::Signal(name) => write!(f, "{}:{name}", BusKind::ControlSignals.name()),
        }
    }
}

/// Value carried by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusPayload {
    /// Physical address driven on the address lines.
    Address(u64),
    /// Word driven on the data lines.
    Word(u64),
    /// Asserted or released control line.
    Level(bool),
}

impl BusPayload {
    /// Address carried by the payload, if any.
    #[must_use]
    pub const fn address(self) -> Option<u64> {
        match self {
            Self::Address(address) => Some(address),
            Self::Word(_) | Self::Level(_) => None,
        }
    }

    /// Data word carried by the payload, if any.
    #[must_use]
    pub const fn word(self) -> Option<u64> {
        match self {
            Self::Word(word) => Some(word),
            Self::Address(_) | Self::Level(_) => None,
        }
    }

    /// Control level carried by the payload, if any.
    #[must_use]
    pub const fn level(self) -> Option<bool> {
        match self {
            Self::Level(level) => Some(level),
            Self::Address(_) | Self::Word(_) => None,
        }
    }
}

type Handler = Rc<RefCell<dyn FnMut(&BusPayload) -> Result<(), MachineError>>>;

struct Listener {
    id: u64,
    key: ChannelKey,
    handler: Handler,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: Vec<Listener>,
}

/// A broadcast channel modelling one group of signal lines.
///
/// Cloning a bus yields another handle to the same listener table.
#[derive(Clone)]
pub struct Bus {
    kind: BusKind,
    policy: SignalPolicy,
    table: Rc<RefCell<ListenerTable>>,
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("kind", &self.kind)
            .field("policy", &self.policy)
            .field("listeners", &self.table.borrow().listeners.len())
            .finish()
    }
}

impl Bus {
    /// Creates an address bus.
    #[must_use]
    pub fn address() -> Self {
        Self::with_policy(BusKind::Address, SignalPolicy::Plain)
    }

    /// Creates a data bus.
    #[must_use]
    pub fn data() -> Self {
        Self::with_policy(BusKind::Data, SignalPolicy::Plain)
    }

    /// Creates a control bus validated against `architecture`.
    #[must_use]
    pub fn control(architecture: Architecture) -> Self {
        Self::with_policy(
            BusKind::ControlSignals,
            SignalPolicy::Checked(architecture),
        )
    }

    fn with_policy(kind: BusKind, policy: SignalPolicy) -> Self {
        Self {
            kind,
            policy,
            table: Rc::new(RefCell::new(ListenerTable::default())),
        }
    }

    /// Role of this bus.
    #[must_use]
    pub const fn kind(&self) -> BusKind {
        self.kind
    }

    /// Channel resolution strategy of this bus.
    #[must_use]
    pub const fn policy(&self) -> SignalPolicy {
        self.policy
    }

    /// Resolves the dispatch key for an optional signal name.
    ///
    /// # Errors
    ///
    /// On a checked bus, returns [`MachineError::MissingSignal`] when no name is
    /// given and [`MachineError::InvalidSignal`] when the name is not defined by
    /// the architecture.
    pub fn resolve(&self, signal: Option<&str>) -> Result<ChannelKey, MachineError> {
        match self.policy {
            SignalPolicy::Plain => Ok(ChannelKey::Bus(self.kind)),
            SignalPolicy::Checked(architecture) => {
                let name = signal.ok_or(MachineError::MissingSignal { architecture })?;
                architecture
                    .signal(name)
                    .map(|spec| ChannelKey::Signal(spec.name))
                    .ok_or_else(|| MachineError::InvalidSignal {
                        signal: name.to_owned(),
                        architecture,
                    })
            }
        }
    }

    /// Publishes `payload` to every handler registered for the resolved channel
    /// when the send starts, in registration order.
    ///
    /// # Errors
    ///
    /// Fails before any dispatch when the signal does not resolve. Otherwise
    /// returns the first handler error, which stops the dispatch, or
    /// [`MachineError::ReentrantDispatch`] when a running handler is reached
    /// again through nested sends.
    pub fn send(&self, signal: Option<&str>, payload: BusPayload) -> Result<(), MachineError> {
        let key = self.resolve(signal)?;
        let handlers: Vec<Handler> = self
            .table
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.key == key)
            .map(|listener| Rc::clone(&listener.handler))
            .collect();

        debug!(channel = %key, ?payload, listeners = handlers.len(), "bus dispatch");

        for handler in handlers {
            let mut callback =
                handler
                    .try_borrow_mut()
                    .map_err(|_| MachineError::ReentrantDispatch {
                        channel: key.to_string(),
                    })?;
            (&mut *callback)(&payload)?;
        }
        Ok(())
    }

    /// Registers `handler` for the resolved channel.
    ///
    /// # Errors
    ///
    /// Fails with the same signal validation errors as [`Bus::send`].
    pub fn subscribe<F>(&self, signal: Option<&str>, handler: F) -> Result<Subscription, MachineError>
    where
        F: FnMut(&BusPayload) -> Result<(), MachineError> + 'static,
    {
        let key = self.resolve(signal)?;
        let handler: Handler = Rc::new(RefCell::new(handler));
        let mut table = self.table.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.listeners.push(Listener { id, key, handler });

        debug!(channel = %key, id, "bus subscribe");
        Ok(Subscription {
            id,
            key,
            table: Rc::downgrade(&self.table),
            detached: false,
        })
    }

    /// Number of handlers registered for the resolved channel.
    ///
    /// # Errors
    ///
    /// Fails with the same signal validation errors as [`Bus::send`].
    pub fn listener_count(&self, signal: Option<&str>) -> Result<usize, MachineError> {
        let key = self.resolve(signal)?;
        Ok(self
            .table
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.key == key)
            .count())
    }
}

/// Handle to a registered handler; dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes its handler"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    key: ChannelKey,
    table: Weak<RefCell<ListenerTable>>,
    detached: bool,
}

impl Subscription {
    /// Channel the handler is registered on.
    #[must_use]
    pub const fn channel(&self) -> ChannelKey {
        self.key
    }

    /// Returns `true` while the handler is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.table.upgrade().is_some_and(|table| {
            table
                .borrow()
                .listeners
                .iter()
                .any(|listener| listener.id == self.id)
        })
    }

    /// Unsubscribes immediately.
    pub fn cancel(self) {
        drop(self);
    }

    /// Keeps the handler registered for the lifetime of the bus.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(table) = self.table.upgrade() {
            // The handler may own further subscriptions on this bus, so it is
            // dropped only after the table borrow ends.
            let removed = {
                let mut table = table.borrow_mut();
                table
                    .listeners
                    .iter()
                    .position(|listener| listener.id == self.id)
                    .map(|index| table.listeners.remove(index))
            };
            drop(removed);
            debug!(channel = %self.key, id = self.id, "bus unsubscribe");
        }
    }
}

/// The three buses of one machine instance.
#[derive(Debug, Clone)]
pub struct SystemBuses {
    /// Address bus.
    pub address: Bus,
    /// Data bus.
    pub data: Bus,
    /// Control bus.
    pub control: Bus,
}

impl SystemBuses {
    /// Creates fresh, unconnected buses for `architecture`.
    #[must_use]
    pub fn new(architecture: Architecture) -> Self {
        Self {
            address: Bus::address(),
            data: Bus::data(),
            control: Bus::control(architecture),
        }
    }
}

impl Default for SystemBuses {
    fn default() -> Self {
        Self::new(Architecture::default())
    }
}
