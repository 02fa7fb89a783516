#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

#[derive(Arbitrary, Debug)]
enum Name {
    A, B, F, N, Puts,
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Name::A => "a",
            Name::B => "b",
            Name::F => "f",
            Name::N => "n",
            Name::Puts => "puts",
        })
    }
}

#[derive(Arbitrary, Debug)]
enum Operator {
    Plus, Minus, Asterisk, Slash,
    Equal, NotEqual, Less, Greater,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Asterisk => "*",
            Operator::Slash => "/",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
        })
    }
}

#[derive(Arbitrary, Debug)]
enum MonkeyExpression {
    Integer(i64),
    Boolean(bool),
    Identifier(Name),
    Not(Box<MonkeyExpression>),
    Negate(Box<MonkeyExpression>),
    Infix(Box<MonkeyExpression>, Operator, Box<MonkeyExpression>),
    If(Box<MonkeyExpression>, Vec<MonkeyStatement>, Option<Vec<MonkeyStatement>>),
    Function(Vec<Name>, Vec<MonkeyStatement>),
    Call(Box<MonkeyExpression>, Vec<MonkeyExpression>),
}

#[derive(Arbitrary, Debug)]
enum MonkeyStatement {
    Let(Name, MonkeyExpression),
    Return(MonkeyExpression),
    Expression(MonkeyExpression),
}

fn block(statements: &[MonkeyStatement]) -> String {
    format!("{{ {} }}", statements.iter().join(" "))
}

impl fmt::Display for MonkeyExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Negative literals don't exist, the minus is a prefix operator
            MonkeyExpression::Integer(value) => write!(f, "{}", value.unsigned_abs().min(i64::MAX as u64)),
            MonkeyExpression::Boolean(value) => write!(f, "{}", value),
            MonkeyExpression::Identifier(name) => write!(f, "{}", name),
            MonkeyExpression::Not(right) => write!(f, "(!{})", right),
            MonkeyExpression::Negate(right) => write!(f, "(-{})", right),
            MonkeyExpression::Infix(left, operator, right) => write!(f, "({} {} {})", left, operator, right),
            MonkeyExpression::If(condition, consequence, alternative) => {
                write!(f, "if ({}) {}", condition, block(consequence))?;
                match alternative {
                    Some(alternative) => write!(f, " else {}", block(alternative)),
                    None => Ok(()),
                }
            }
            MonkeyExpression::Function(parameters, body) => write!(f, "fn({}) {}", parameters.iter().join(", "), block(body)),
            MonkeyExpression::Call(function, arguments) => write!(f, "({})({})", function, arguments.iter().join(", ")),
        }
    }
}

impl fmt::Display for MonkeyStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonkeyStatement::Let(name, value) => write!(f, "let {} = {};", name, value),
            MonkeyStatement::Return(value) => write!(f, "return {};", value),
            MonkeyStatement::Expression(value) => write!(f, "{};", value),
        }
    }
}

fuzz_target!(|statements: Vec<MonkeyStatement>| {
    let mut context = monkey::EvaluationContext::with_output(std::io::sink());

    for statement in statements {
        let source = statement.to_string();
        // Generated programs are well formed, though they may nest too deeply
        if let Err(monkey::MonkeyError::Parse(errors)) = context.evaluate_str(&source) {
            if !errors.iter().all(|error| matches!(error.kind, monkey::ParseErrorKind::NestingTooDeep(_))) {
                panic!("{:?} failed to parse: {}", source, errors);
            }
        }
    }
});
