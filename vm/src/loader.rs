//! Parses a DSMAL string into a validated, immutable [`Program`].

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use abysmal_decimal::Decimal;

use crate::error::InvalidProgramError;
use crate::opcode::OpCode;
use crate::program::{Instruction, Program};

const MAX_VARIABLES: usize = 65_535;
const MAX_CONSTANTS: usize = 65_535;
const MAX_INSTRUCTIONS: usize = 65_535;
const MAX_PARAM: u32 = 65_535;

pub fn load(source: &str) -> Result<Program, InvalidProgramError> {
    let sections: Vec<&str> = source.split(';').collect();
    if sections.len() != 3 {
        return Err(InvalidProgramError::MissingSections);
    }
    let (variables_section, constants_section, instructions_section) =
        (sections[0], sections[1], sections[2]);

    let variable_names = parse_variables(variables_section)?;
    let mut variable_slots = HashMap::with_capacity(variable_names.len());
    for (slot, name) in variable_names.iter().enumerate() {
        variable_slots.insert(name.clone(), slot as u32);
    }

    let constants = parse_constants(constants_section)?;
    let instructions = parse_instructions(instructions_section)?;

    validate_slot_references(&instructions, variable_names.len(), constants.len())?;

    Ok(Program {
        variable_names,
        variable_slots,
        constants,
        instructions,
        source: source.to_string(),
    })
}

fn parse_variables(section: &str) -> Result<Vec<String>, InvalidProgramError> {
    if section.is_empty() {
        return Ok(Vec::new());
    }

    let names: Vec<&str> = section.split('|').collect();
    if names.len() > MAX_VARIABLES {
        return Err(InvalidProgramError::TooManyVariables);
    }

    let mut seen = HashSet::with_capacity(names.len());
    let mut result = Vec::with_capacity(names.len());
    for name in names {
        if name.is_empty() {
            return Err(InvalidProgramError::InvalidVariableName(String::new()));
        }
        if !seen.insert(name) {
            return Err(InvalidProgramError::DuplicateVariableName(
                name.to_string(),
            ));
        }
        result.push(name.to_string());
    }
    Ok(result)
}

fn parse_constants(section: &str) -> Result<Vec<Decimal>, InvalidProgramError> {
    if section.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<&str> = section.split('|').collect();
    if texts.len() > MAX_CONSTANTS {
        return Err(InvalidProgramError::TooManyConstants);
    }

    texts
        .into_iter()
        .map(|text| {
            Decimal::parse(text)
                .map_err(|_| InvalidProgramError::InvalidConstantValue(text.to_string()))
        })
        .collect()
}

/// A mnemonic is two characters, an uppercase ASCII letter followed by a
/// lowercase one; anything else (including end-of-input after the first
/// letter) is a single-character invalid token.
fn next_token(chars: &[char], pos: usize) -> &[char] {
    let first = chars[pos];
    if first.is_ascii_uppercase()
        && pos + 1 < chars.len()
        && chars[pos + 1].is_ascii_lowercase()
    {
        &chars[pos..pos + 2]
    } else {
        &chars[pos..pos + 1]
    }
}

fn parse_instructions(section: &str) -> Result<Vec<Instruction>, InvalidProgramError> {
    let chars: Vec<char> = section.chars().collect();
    let mut pos = 0;
    let mut instructions = Vec::new();

    while pos < chars.len() {
        let token = next_token(&chars, pos);
        let token_str: String = token.iter().collect();

        let opcode = OpCode::from_str(&token_str)
            .map_err(|_| InvalidProgramError::InvalidInstruction(token_str.clone()))?;
        pos += token.len();

        let param = if opcode.takes_param() {
            let digit_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == digit_start {
                0
            } else {
                let digits: String = chars[digit_start..pos].iter().collect();
                parse_param(&digits)?
            }
        } else {
            0
        };

        instructions.push(Instruction { opcode, param });

        if instructions.len() > MAX_INSTRUCTIONS {
            return Err(InvalidProgramError::TooManyInstructions);
        }
    }

    if instructions.is_empty() {
        return Err(InvalidProgramError::NoInstructions);
    }

    Ok(instructions)
}

fn parse_param(digits: &str) -> Result<u32, InvalidProgramError> {
    if digits.len() > 5 {
        return Err(InvalidProgramError::InstructionParameterTooLarge);
    }
    digits
        .parse::<u32>()
        .ok()
        .filter(|value| *value <= MAX_PARAM)
        .ok_or(InvalidProgramError::InstructionParameterTooLarge)
}

fn validate_slot_references(
    instructions: &[Instruction],
    variable_count: usize,
    constant_count: usize,
) -> Result<(), InvalidProgramError> {
    for instruction in instructions {
        match instruction.opcode {
            OpCode::Lc if instruction.param as usize >= constant_count => {
                return Err(InvalidProgramError::NonexistentConstantSlot(
                    instruction.param,
                ));
            }
            OpCode::Lv | OpCode::St if instruction.param as usize >= variable_count => {
                return Err(InvalidProgramError::NonexistentVariableSlot(
                    instruction.param,
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
