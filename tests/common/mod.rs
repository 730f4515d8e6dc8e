//! Minimal Hack machine: a two-pass assembler and a CPU loop, enough to
//! execute translator output in tests.

#![allow(dead_code)]

use std::collections::HashMap;

const RAM_SIZE: usize = 0x8000;
const FIRST_VARIABLE: u16 = 16;

#[derive(Debug, Clone)]
enum Instr {
    A(u16),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

pub struct Machine {
    rom: Vec<Instr>,
    symbols: HashMap<String, u16>,
    pub ram: Vec<i16>,
    pub a: i16,
    pub d: i16,
    pub pc: usize,
}

fn predefined() -> HashMap<String, u16> {
    let mut symbols: HashMap<String, u16> = [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 0x4000),
        ("KBD", 0x6000),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for r in 0..16 {
        symbols.insert(format!("R{}", r), r);
    }
    symbols
}

fn clean(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

impl Machine {
    pub fn load(asm: &str) -> Machine {
        let mut symbols = predefined();

        // first pass: label addresses
        let mut address = 0u16;
        for line in asm.lines().map(clean).filter(|l| !l.is_empty()) {
            if let Some(label) = line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                assert!(
                    symbols.insert(label.to_string(), address).is_none(),
                    "duplicate label {}",
                    label
                );
            } else {
                address += 1;
            }
        }

        // second pass: instructions, allocating variables as they appear
        let mut next_variable = FIRST_VARIABLE;
        let mut rom = vec![];
        for line in asm.lines().map(clean).filter(|l| !l.is_empty()) {
            if line.starts_with('(') {
                continue;
            }
            if let Some(value) = line.strip_prefix('@') {
                let value = match value.parse::<u16>() {
                    Ok(n) => n,
                    Err(_) => *symbols.entry(value.to_string()).or_insert_with(|| {
                        next_variable += 1;
                        next_variable - 1
                    }),
                };
                rom.push(Instr::A(value));
                continue;
            }
            let (dest, rest) = match line.split_once('=') {
                Some((dest, rest)) => (dest, rest),
                None => ("", line),
            };
            let (comp, jump) = match rest.split_once(';') {
                Some((comp, jump)) => (comp, jump),
                None => (rest, ""),
            };
            rom.push(Instr::C {
                dest: dest.to_string(),
                comp: comp.to_string(),
                jump: jump.to_string(),
            });
        }

        Machine {
            rom,
            symbols,
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    pub fn symbol(&self, name: &str) -> u16 {
        *self.symbols.get(name).unwrap_or_else(|| panic!("unknown symbol {}", name))
    }

    /// Value of a named variable or register, e.g. `SP` or `Main.0`.
    pub fn read(&self, name: &str) -> i16 {
        self.ram[self.symbol(name) as usize]
    }

    /// The `n` cells below SP, bottom first.
    pub fn stack_top(&self, n: usize) -> Vec<i16> {
        let sp = self.ram[0] as usize;
        self.ram[sp - n..sp].to_vec()
    }

    fn addr(&self) -> usize {
        (self.a as u16 as usize) % RAM_SIZE
    }

    fn compute(&self, comp: &str) -> i16 {
        let (a, d) = (self.a, self.d);
        let m = self.ram[self.addr()];
        match comp {
            "0" => 0,
            "1" => 1,
            "-1" => -1,
            "D" => d,
            "A" => a,
            "M" => m,
            "!D" => !d,
            "!A" => !a,
            "!M" => !m,
            "-D" => d.wrapping_neg(),
            "-A" => a.wrapping_neg(),
            "-M" => m.wrapping_neg(),
            "D+1" => d.wrapping_add(1),
            "A+1" => a.wrapping_add(1),
            "M+1" => m.wrapping_add(1),
            "D-1" => d.wrapping_sub(1),
            "A-1" => a.wrapping_sub(1),
            "M-1" => m.wrapping_sub(1),
            "D+A" | "A+D" => d.wrapping_add(a),
            "D+M" | "M+D" => d.wrapping_add(m),
            "D-A" => d.wrapping_sub(a),
            "D-M" => d.wrapping_sub(m),
            "A-D" => a.wrapping_sub(d),
            "M-D" => m.wrapping_sub(d),
            "D&A" | "A&D" => d & a,
            "D&M" | "M&D" => d & m,
            "D|A" | "A|D" => d | a,
            "D|M" | "M|D" => d | m,
            other => panic!("unsupported comp {}", other),
        }
    }

    fn step(&mut self) {
        match self.rom[self.pc].clone() {
            Instr::A(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::C { dest, comp, jump } => {
                let out = self.compute(&comp);
                let target = self.a as u16 as usize;
                if dest.contains('M') {
                    let addr = self.addr();
                    self.ram[addr] = out;
                }
                if dest.contains('A') {
                    self.a = out;
                }
                if dest.contains('D') {
                    self.d = out;
                }
                let taken = match jump.as_str() {
                    "" => false,
                    "JGT" => out > 0,
                    "JEQ" => out == 0,
                    "JGE" => out >= 0,
                    "JLT" => out < 0,
                    "JNE" => out != 0,
                    "JLE" => out <= 0,
                    "JMP" => true,
                    other => panic!("unsupported jump {}", other),
                };
                self.pc = if taken { target } else { self.pc + 1 };
            }
        }
    }

    /// Runs until execution falls off the end of the program.
    pub fn run(&mut self, max_steps: usize) {
        for _ in 0..max_steps {
            if self.pc >= self.rom.len() {
                return;
            }
            self.step();
        }
        panic!("program did not finish within {} steps", max_steps);
    }

    /// Runs until the program counter reaches `label`.
    pub fn run_until(&mut self, label: &str, max_steps: usize) {
        let stop = self.symbol(label) as usize;
        for _ in 0..max_steps {
            if self.pc == stop {
                return;
            }
            assert!(self.pc < self.rom.len(), "ran off the end before {}", label);
            self.step();
        }
        panic!("{} not reached within {} steps", label, max_steps);
    }
}
