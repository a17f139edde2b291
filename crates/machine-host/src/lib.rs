//! Host wiring for the x86 bus simulator.
//!
//! [`Machine`] assembles buses, a processor and a memory array from a
//! [`MachineConfig`], loads instruction text into memory and drives
//! fetch/decode steps. Step and run reports serialize to JSON for the
//! `x86-sim` driver.

use instruction_codec::encode;
use machine_core::{
    MachineConfig, MachineError, Memory, MemoryTopology, Microprocessor, SystemBuses,
};
use serde::{Deserialize, Serialize};
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use tracing::info;
use tracing_subscriber as _;

/// Outcome of one fetch/decode step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Address driven during the fetch.
    pub physical_address: u64,
    /// Word returned by memory, if any.
    pub word: Option<u64>,
    /// Whether the word entered the prefetch queue.
    pub enqueued: bool,
    /// Text decoded from the oldest queued word.
    pub text: Option<String>,
}

/// Outcome of a multi-step run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-step reports in execution order.
    pub steps: Vec<StepReport>,
    /// Concatenated decoded text.
    pub text: String,
}

/// A fully wired machine instance.
#[derive(Debug)]
pub struct Machine {
    config: MachineConfig,
    buses: SystemBuses,
    cpu: Microprocessor,
    memory: Memory,
}

impl Machine {
    /// Wires buses, processor and memory for `config`.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error raised while wiring, such as
    /// [`MachineError::SpecMismatch`] or [`MachineError::UnsupportedWordSize`].
    pub fn new(config: &MachineConfig) -> Result<Self, MachineError> {
        let buses = SystemBuses::new(config.architecture);
        let cpu = Microprocessor::new(config.address_lines, config.mode, &buses)?
            .with_codec_word(config.codec_word()?);
        let memory = Memory::new(&cpu, config.chip_spec()?, &buses)?;
        Ok(Self {
            config: *config,
            buses,
            cpu,
            memory,
        })
    }

    /// Configuration the machine was built from.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Shared buses.
    #[must_use]
    pub const fn buses(&self) -> &SystemBuses {
        &self.buses
    }

    /// Processor.
    #[must_use]
    pub const fn cpu(&self) -> &Microprocessor {
        &self.cpu
    }

    /// Memory array.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Memory geometry.
    #[must_use]
    pub fn topology(&self) -> MemoryTopology {
        self.memory.topology()
    }

    /// Encodes each instruction into one word and stores the words
    /// consecutively from address zero. Returns the number of words stored.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::Codec`] when an instruction does not fit a word
    /// and [`MachineError::AddressOutOfRange`] when the program does not fit
    /// memory.
    pub fn load_program(&mut self, program: &[&str]) -> Result<usize, MachineError> {
        let word = self.cpu.eu().codec_word();
        let stride = u64::from(word.bits() / 8);
        for (index, instruction) in (0_u64..).zip(program) {
            let value = encode(instruction, word)?;
            self.memory.write(index * stride, value)?;
        }
        info!(words = program.len(), "program loaded");
        Ok(program.len())
    }

    /// Rebuilds the machine from its configuration, clearing memory and
    /// registers.
    ///
    /// # Errors
    ///
    /// Same as [`Machine::new`].
    pub fn reset(&mut self) -> Result<(), MachineError> {
        *self = Self::new(&self.config)?;
        Ok(())
    }

    /// Fetches one word and decodes the oldest queued word.
    ///
    /// # Errors
    ///
    /// Propagates fetch and decode failures.
    pub fn step(&mut self) -> Result<StepReport, MachineError> {
        let outcome = self.cpu.fetch()?;
        let text = self.cpu.decode()?.map(|decoded| decoded.text);
        Ok(StepReport {
            physical_address: outcome.physical_address,
            word: outcome.word,
            enqueued: outcome.enqueued,
            text,
        })
    }

    /// Runs `steps` fetch/decode steps.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error.
    pub fn run(&mut self, steps: usize) -> Result<RunReport, MachineError> {
        let mut report = RunReport::default();
        for _ in 0..steps {
            let step = self.step()?;
            if let Some(text) = &step.text {
                report.text.push_str(text);
            }
            report.steps.push(step);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use machine_core::{MachineConfig, MachineError, Mode, WordSize};

    use super::Machine;

    #[test]
    fn default_machine_runs_a_program() {
        let mut machine = Machine::new(&MachineConfig::default()).expect("default wiring");
        assert_eq!(machine.topology().total_bytes, 1024);
        assert_eq!(machine.load_program(&["M", "O", "V"]), Ok(3));

        let report = machine.run(3).expect("run");
        assert_eq!(report.text, "MOV");
        assert_eq!(report.steps[0].word, Some(0x4D));
        assert_eq!(report.steps[2].physical_address, 2);
    }

    #[test]
    fn wide_words_use_a_matching_stride() {
        let config = MachineConfig {
            word_size_bits: 16,
            ..MachineConfig::default()
        };
        let mut machine = Machine::new(&config).expect("wiring");
        assert_eq!(machine.memory().topology().chip.word_size, WordSize::Word);
        machine.load_program(&["MV", "AX"]).expect("load");

        let first = machine.step().expect("step");
        assert_eq!(first.text.as_deref(), Some("MV"));
        // Word addresses advance by one location; bytes by two.
        let second = machine.step().expect("step");
        assert_eq!(second.text.as_deref(), Some("AX"));
    }

    #[test]
    fn oversized_instruction_is_a_codec_error() {
        let mut machine = Machine::new(&MachineConfig::default()).expect("wiring");
        assert!(matches!(
            machine.load_program(&["MOV"]),
            Err(MachineError::Codec(_))
        ));
    }

    #[test]
    fn reset_clears_memory_and_pointer() {
        let mut machine = Machine::new(&MachineConfig::default()).expect("wiring");
        machine.load_program(&["M"]).expect("load");
        machine.step().expect("step");
        machine.reset().expect("reset");
        assert_eq!(machine.cpu().instruction_pointer().offset_value(), 0);
        assert_eq!(machine.step().expect("step").word, Some(0));
    }

    #[test]
    fn protected_mode_cannot_fetch() {
        let config = MachineConfig {
            mode: Mode::Protected,
            ..MachineConfig::default()
        };
        let mut machine = Machine::new(&config).expect("wiring");
        assert_eq!(
            machine.step(),
            Err(MachineError::UnsupportedMode {
                mode: Mode::Protected
            })
        );
    }
}
