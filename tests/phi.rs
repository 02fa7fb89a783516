use monkey::{evaluate, EvaluationContext, MonkeyError, Object, RuntimeError};
use pretty_assertions::assert_eq;

const PHI: &str = include_str!("../scripts/phi.mky");

#[test]
fn phi_script() -> anyhow::Result<()> {
    let mut output = Vec::new();

    let result = evaluate(PHI, &mut output)?;

    assert_eq!(result, Object::Integer(89));
    assert_eq!(String::from_utf8(output)?, "1 1 2 3 5 8\n89\n");
    Ok(())
}

#[test]
fn phi_sequence() -> anyhow::Result<()> {
    let answers = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89];

    for (n, answer) in answers.into_iter().enumerate() {
        let source = format!("{}\nphi({});", PHI, n);
        assert_eq!(evaluate(&source, std::io::sink())?, Object::Integer(answer));
    }
    Ok(())
}

#[test]
fn phi_rejects_wrong_arity() -> anyhow::Result<()> {
    let mut context = EvaluationContext::with_output(std::io::sink());
    context.evaluate_str(PHI)?;

    assert_eq!(
        context.evaluate_str("phi(1, 2)"),
        Err(MonkeyError::Runtime(RuntimeError::WrongArgumentCount { expected: 1, got: 2 }))
    );
    assert_eq!(context.evaluate_str("phi(true)"), Err(MonkeyError::Runtime(RuntimeError::TypeMismatch {
        left: monkey::ObjectType::Boolean,
        operator: monkey::InfixOperator::Equal,
        right: monkey::ObjectType::Integer,
    })));
    Ok(())
}
