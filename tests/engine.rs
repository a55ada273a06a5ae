use approx::assert_abs_diff_eq;
use calculaterm::{
    compile, eval, evaluate, find_intersection, tokenize, validate_expression, DomainError,
    EngineError, Function, Registry, Workbook,
};
use std::f64::consts::PI;

#[test]
fn linear_function() {
    let registry = Registry::new();
    let f = compile("2*x+1", &registry).unwrap();
    assert_eq!(evaluate(&f, 3.0, &registry), Ok(7.0));
}

#[test]
fn evaluation_is_pure() {
    let registry = Registry::new();
    for text in &["2*x+1", "sin(x)^2 + cos(x)^2", "x^3 - 2x", "sqrt(abs(x)) / 3", "d/dx(x^2)"] {
        let f = compile(text, &registry).unwrap();
        for &x in &[-2.5, 0.0, 1.0, 7.25] {
            let first = evaluate(&f, x, &registry);
            for _ in 0..3 {
                assert_eq!(evaluate(&f, x, &registry), first, "{} at {}", text, x);
            }
        }
    }
}

#[test]
fn domain_errors() {
    let registry = Registry::new();
    let f = compile("1/x", &registry).unwrap();
    assert_eq!(evaluate(&f, 0.0, &registry), Err(DomainError::DivisionByZero));

    let f = compile("sqrt(x)", &registry).unwrap();
    assert!(matches!(
        evaluate(&f, -4.0, &registry),
        Err(DomainError::OutOfDomain { .. })
    ));
    assert!(matches!(
        eval("ln(x)", 0.0, &registry),
        Err(EngineError::Domain(DomainError::OutOfDomain { .. }))
    ));
}

#[test]
fn derivative_of_square() {
    let registry = Registry::new();
    let f = compile("d/dx(x^2)", &registry).unwrap();
    assert_abs_diff_eq!(evaluate(&f, 3.0, &registry).unwrap(), 6.0, epsilon = 1e-4);

    let f = compile("d/dx(sqrt(x))", &registry).unwrap();
    assert_eq!(evaluate(&f, 0.0, &registry), Err(DomainError::NoDerivative));
}

#[test]
fn user_constant_is_independent_of_x() {
    let mut registry = Registry::new();
    registry.define_or_update("r = 5").unwrap();
    let area = compile("pi*r^2", &registry).unwrap();
    for &x in &[-3.0, 0.0, 12.0] {
        assert_abs_diff_eq!(evaluate(&area, x, &registry).unwrap(), PI * 25.0, epsilon = 1e-12);
    }
}

#[test]
fn redefinition_is_seen_by_callers() {
    let mut registry = Registry::new();
    registry.define_or_update("f = x + 1").unwrap();
    let g = compile("2 f(x)", &registry).unwrap();
    assert_eq!(evaluate(&g, 1.0, &registry), Ok(4.0));

    registry.remove("f");
    registry.define_or_update("f = x + 10").unwrap();
    assert_eq!(evaluate(&g, 1.0, &registry), Ok(22.0));

    registry.remove("f");
    assert_eq!(
        evaluate(&g, 1.0, &registry),
        Err(DomainError::Undefined("f".into()))
    );
}

#[test]
fn rename_keeps_every_row_equivalent() {
    let mut workbook = Workbook::new();
    for text in &["r = 5", "a = pi r^2", "y3 = r x + a", "y4 = y3(x) - r"] {
        let index = workbook.push_row();
        workbook.edit(index, text).unwrap();
    }
    let xs = [-1.0, 0.5, 3.0];
    let before: Vec<_> = (0..4)
        .flat_map(|i| xs.iter().map(move |&x| (i, x)))
        .map(|(i, x)| workbook.evaluate(i, x))
        .collect();

    workbook.edit(0, "s = 5").unwrap();

    for row in workbook.rows().iter().skip(1) {
        assert!(!row.text().contains('r'), "{:?}", row.text());
        assert!(row.error().is_none());
    }
    let after: Vec<_> = (0..4)
        .flat_map(|i| xs.iter().map(move |&x| (i, x)))
        .map(|(i, x)| workbook.evaluate(i, x))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn intersection_with_zero() {
    let registry = Registry::new();
    let f = Function::compile("x-2", &registry).unwrap();
    let g = Function::compile("0", &registry).unwrap();
    let x = find_intersection(&f, &g, &registry, 0.0).unwrap();
    assert!(f.eval(x, &registry).unwrap().abs() < 1e-9);
    assert_abs_diff_eq!(x, 2.0, epsilon = 1e-9);
}

#[test]
fn accepted_text_compiles_to_a_well_formed_tree() {
    let registry = Registry::new();
    let texts = [
        "2x", "-x^2", "3(x+1)", "x(2)", "2 pi x", "x 2", "d/dx(x^3)", "sin(x)cos(x)",
        "(x)(x)", "--x", "2*-x", "x(-1)", "((x))", "-(x+1)", "2 3", "sqrt(x) 2", "e^x/2",
        "1.5x.5", "x^2^3", "abs(-x)",
    ];
    for text in &texts {
        if validate_expression(text).is_err() {
            continue;
        }
        match Function::compile(text, &registry) {
            Ok(f) => {
                let _ = f.eval(1.0, &registry);
            }
            Err(err) => {
                assert!(!err.message.contains("incorrect number of values"), "{}: {}", text, err);
                assert_ne!(err.message, "not enough operands", "{}", text);
            }
        }
    }
}

#[test]
fn parenthesis_errors_point_at_the_parenthesis() {
    let registry = Registry::new();
    for &(text, position) in &[
        ("(x + 1", 0),
        ("x + 1)", 5),
        ("sin(x", 3),
        ("2*(x+(1)", 2),
        ("(x))", 3),
        ("é + (x", 5),
    ] {
        let err = tokenize(text, &registry).unwrap_err();
        assert_eq!(err.position, position, "{}", text);
        assert!(text[position..].starts_with('(') || text[position..].starts_with(')'));
    }
}

#[test]
fn definitions_report_errors() {
    let mut registry = Registry::new();
    assert!(registry.define_or_update("x = 2").is_err());
    assert!(registry.define_or_update("sin = 2").is_err());
    assert!(registry.define_or_update("q = 1 +").is_err());
    assert!(registry.define_or_update("q = 1/0").is_err());
    assert!(registry.get("q").is_none());
    assert_eq!(registry.user_definitions().count(), 0);
}

#[test]
fn derivative_chains_stay_bounded() {
    let mut registry = Registry::new();
    registry.define_or_update("fa = d/dx(x^3)").unwrap();
    let names: Vec<String> = (0..40).map(|i| format!("f{}", i)).collect();
    registry
        .define_or_update(&format!("{} = d/dx(fa(x))", names[0]))
        .unwrap();
    for pair in names.windows(2) {
        registry
            .define_or_update(&format!("{} = d/dx({}(x))", pair[1], pair[0]))
            .unwrap();
    }

    let f = compile("f1(x)", &registry).unwrap();
    assert!(evaluate(&f, 1.0, &registry).is_ok());

    let f = compile("f39(x)", &registry).unwrap();
    assert!(matches!(
        evaluate(&f, 1.0, &registry),
        Err(ref err) if err.is_limit()
    ));
}

#[test]
fn long_polynomials_compile() {
    let registry = Registry::new();
    let text = (1..=150)
        .map(|i| format!("{}x^{}", i % 7, i % 4))
        .collect::<Vec<_>>()
        .join(" + ");
    let f = compile(&text, &registry).unwrap();
    let expected: f64 = (1..=150).map(|i| f64::from(i % 7) * 2f64.powi(i % 4)).sum();
    assert_abs_diff_eq!(evaluate(&f, 2.0, &registry).unwrap(), expected, epsilon = 1e-9);
}
