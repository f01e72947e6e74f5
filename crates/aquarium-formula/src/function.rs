use crate::FormulaError;
use crate::eval::EvalError;

/// Built-in functions. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    Sqrt,
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Floor,
    Ceil,
    Round,
    Trunc,
    Pow,
    Mod,
    Hypot,
}

enum Arity {
    Fixed(&'static [&'static str]),
    AtLeastOne,
}

const ALL: &[Function] = &[
    Function::Min,
    Function::Max,
    Function::Sqrt,
    Function::Abs,
    Function::Sin,
    Function::Cos,
    Function::Tan,
    Function::Asin,
    Function::Acos,
    Function::Atan,
    Function::Atan2,
    Function::Floor,
    Function::Ceil,
    Function::Round,
    Function::Trunc,
    Function::Pow,
    Function::Mod,
    Function::Hypot,
];

impl Function {
    pub fn lookup(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|function| function.name() == name)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        ALL.iter().map(|function| function.name())
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Atan2 => "atan2",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Round => "round",
            Function::Trunc => "trunc",
            Function::Pow => "pow",
            Function::Mod => "mod",
            Function::Hypot => "hypot",
        }
    }

    fn arity(self) -> Arity {
        match self {
            Function::Min | Function::Max => Arity::AtLeastOne,
            Function::Atan2 => Arity::Fixed(&["y", "x"]),
            Function::Pow => Arity::Fixed(&["base", "exponent"]),
            Function::Mod => Arity::Fixed(&["dividend", "divisor"]),
            Function::Hypot => Arity::Fixed(&["a", "b"]),
            _ => Arity::Fixed(&["value"]),
        }
    }

    pub(crate) fn check_arity(self, count: usize) -> Result<(), FormulaError> {
        match self.arity() {
            Arity::AtLeastOne if count == 0 => Err(FormulaError::new(format!(
                "{} expects at least 1 argument",
                self.name()
            ))),
            Arity::AtLeastOne => Ok(()),
            Arity::Fixed(expected) if count < expected.len() => Err(FormulaError::new(format!(
                "missing argument '{}' for {}",
                expected[count],
                self.name()
            ))),
            Arity::Fixed(expected) if count > expected.len() => Err(FormulaError::new(format!(
                "too many arguments for {}: expected {}, got {}",
                self.name(),
                expected.len(),
                count
            ))),
            Arity::Fixed(_) => Ok(()),
        }
    }

    /// Applies the function to already evaluated arguments; arity was checked at parse time.
    pub(crate) fn apply(self, args: &[f64]) -> Result<f64, EvalError> {
        let arg = |index: usize| args.get(index).copied().unwrap_or(f64::NAN);
        let value = match self {
            Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Function::Sqrt => {
                let x = arg(0);
                if x < 0.0 {
                    return Err(EvalError::Domain {
                        function: self.name(),
                        value: x,
                    });
                }
                x.sqrt()
            }
            Function::Abs => arg(0).abs(),
            Function::Sin => arg(0).to_radians().sin(),
            Function::Cos => arg(0).to_radians().cos(),
            Function::Tan => arg(0).to_radians().tan(),
            Function::Asin | Function::Acos => {
                let x = arg(0);
                if !(-1.0..=1.0).contains(&x) {
                    return Err(EvalError::Domain {
                        function: self.name(),
                        value: x,
                    });
                }
                if self == Function::Asin {
                    x.asin().to_degrees()
                } else {
                    x.acos().to_degrees()
                }
            }
            Function::Atan => arg(0).atan().to_degrees(),
            Function::Atan2 => arg(0).atan2(arg(1)).to_degrees(),
            Function::Floor => arg(0).floor(),
            Function::Ceil => arg(0).ceil(),
            Function::Round => arg(0).round(),
            Function::Trunc => arg(0).trunc(),
            Function::Pow => arg(0).powf(arg(1)),
            Function::Mod => {
                let divisor = arg(1);
                if divisor == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                arg(0) % divisor
            }
            Function::Hypot => arg(0).hypot(arg(1)),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Function;

    #[test]
    fn every_function_round_trips_through_its_name() {
        for name in Function::names() {
            let function = Function::lookup(name).expect("listed names should resolve");
            assert_eq!(function.name(), name);
        }
        assert_eq!(Function::lookup("median"), None);
    }

    #[test]
    fn max_and_min_fold_all_arguments() {
        let args = [57.0, 46.5, 40.0, 57.0, 46.5, 40.0];
        assert_eq!(Function::Max.apply(&args).expect("max"), 57.0);
        assert_eq!(Function::Min.apply(&args).expect("min"), 40.0);
    }

    #[test]
    fn mod_by_zero_is_an_error() {
        let err = Function::Mod.apply(&[4.0, 0.0]).expect_err("should fail");
        assert!(err.to_string().contains("division by zero"));
        assert!(Function::Mod.apply(&[4.0, 1e-20]).is_ok());
    }
}
