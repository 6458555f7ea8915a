use super::*;

#[test]
fn variables_and_indices_are_assignable() {
    assert!(Expr::var("x").is_assignable());
    assert!(Expr::index(Expr::var("xs"), Expr::number(0.0)).is_assignable());
    assert!(
        Expr::index(Expr::index(Expr::var("m"), Expr::number(1.0)), Expr::number(2.0))
            .is_assignable()
    );
}

#[test]
fn other_expressions_are_not_assignable() {
    assert!(!Expr::number(1.0).is_assignable());
    assert!(!Expr::call("F", vec![]).is_assignable());
    assert!(!Expr::index(Expr::array(vec![]), Expr::number(0.0)).is_assignable());
    assert!(!Expr::binary(BinaryOp::Plus, Expr::var("a"), Expr::var("b")).is_assignable());
}

#[test]
fn function_params_keep_order() {
    let f = Function::new("Sum", &["a", "b"], Stmt::block(vec![]));
    assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn operator_classification() {
    assert!(BinaryOp::And.is_short_circuit());
    assert!(BinaryOp::Or.is_short_circuit());
    assert!(!BinaryOp::Plus.is_short_circuit());
    assert_eq!(BinaryOp::Differs.as_symbol(), "!=");
    assert_eq!(UnaryOp::Not.as_symbol(), "not");
}
