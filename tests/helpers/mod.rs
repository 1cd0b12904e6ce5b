#![allow(dead_code)] // not every integration test uses every helper

use calabash_solver::Literal;
use calabash_solver::Variable;
use calabash_solver::VariableKind;

pub fn lit(ordinal: u32) -> Literal {
    Literal::new(ordinal)
}

pub fn bool_var(ordinal: u32) -> Variable {
    Variable::new(VariableKind::Boolean, ordinal)
}

pub fn rational_var(ordinal: u32) -> Variable {
    Variable::new(VariableKind::Rational, ordinal)
}
