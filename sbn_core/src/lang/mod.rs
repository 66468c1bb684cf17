//! # Grammar for network descriptions
//! ```BNF
//! @eol_comments   ::  /#.*?$/
//!
//! net         = ${statement}* ;
//! statement   = network | variable | evidence ;
//! network     = 'network' name ';' ;
//! variable    = 'variable' name states ['|' parents] ['=' table] ';' ;
//! evidence    = 'evidence' name '=' name ';' ;
//! states      = '[' name ${',' name}* ']' ;
//! parents     = name ${',' name}* ;
//! table       = '[' number ${',' number}* ']' ;
//! name        = regex: [a-zA-Z0-9_\-]+ ;
//! number      = regex: [0-9\.eE\+\-]+ ;
//! ```
//!
//! Tables list one row per combination of parent states, the first parent
//! varying the slowest, each row holding the probability of every state of
//! the variable in declaration order. Parents may be declared after their children.
//!
//! ```text
//! network sprinkler;
//! variable cloudy [true, false] = [0.5, 0.5];
//! variable rain [true, false] | cloudy = [0.8, 0.2, 0.2, 0.8];
//! evidence rain = true;
//! ```
use std::fmt::Write;
use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{cut, opt},
    error::{ErrorKind, ParseError},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, tuple},
};

use crate::net::is_name_char;
use crate::{Net, ParseErr};

type IResult<'a, O> = nom::IResult<&'a str, O, ParseErrB<'a>>;

const FRAGMENT_LEN: usize = 40;

#[derive(Debug, PartialEq)]
enum ParseErrB<'a> {
    Nom(&'a str, ErrorKind),
    Expected(&'static str, &'a str),
}

impl<'a> ParseError<&'a str> for ParseErrB<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        ParseErrB::Nom(input, kind)
    }

    fn append(_: &'a str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a> From<ParseErrB<'a>> for ParseErr {
    fn from(err: ParseErrB<'a>) -> ParseErr {
        match err {
            ParseErrB::Nom(input, _) => ParseErr::Syntax(fragment(input)),
            ParseErrB::Expected(expected, input) => ParseErr::Expected {
                expected,
                found: fragment(input),
            },
        }
    }
}

fn fragment(input: &str) -> String {
    let line = input.trim_start().lines().next().unwrap_or("");
    if line.is_empty() {
        "end of input".to_owned()
    } else {
        line.chars().take(FRAGMENT_LEN).collect()
    }
}

#[derive(Debug, PartialEq)]
enum Statement<'a> {
    Network(&'a str),
    Variable(VarDecl<'a>),
    Evidence(&'a str, &'a str),
}

#[derive(Debug, PartialEq)]
struct VarDecl<'a> {
    name: &'a str,
    states: Vec<&'a str>,
    parents: Vec<&'a str>,
    table: Option<Vec<f64>>,
}

/// Parses a network description, see the module docs for the format.
pub fn parse_net(source: &str) -> Result<Net, ParseErr> {
    let clean = remove_comments(source);
    let statements = match statements(&clean) {
        Ok((_, statements)) => statements,
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => return Err(err.into()),
        Err(nom::Err::Incomplete(_)) => return Err(ParseErr::Syntax(fragment(""))),
    };
    build_net(statements)
}

/// Writes a network (and its evidence) in the description format.
pub fn write_net(net: &Net) -> String {
    let mut out = String::new();
    let vars = net.variables();
    // writing to a String never fails
    let _ = writeln!(out, "network {};", net.name());
    for var in vars {
        let _ = write!(out, "variable {} [{}]", var.name(), var.states().join(", "));
        if !var.parents().is_empty() {
            let parents: Vec<&str> = var.parents().iter().map(|p| vars[*p].name()).collect();
            let _ = write!(out, " | {}", parents.join(", "));
        }
        if let Some(table) = var.table() {
            let probs: Vec<String> = table.as_slice().iter().map(|p| p.to_string()).collect();
            let _ = write!(out, " = [{}]", probs.join(", "));
        }
        out.push_str(";\n");
    }
    for (var, state) in net.evidence_iter() {
        let _ = writeln!(out, "evidence {} = {};", var, state);
    }
    out
}

fn remove_comments(input: &str) -> String {
    let mut clean = String::with_capacity(input.len());
    for line in input.lines() {
        let code = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        clean.push_str(code);
        clean.push('\n');
    }
    clean
}

fn build_net(statements: Vec<Statement>) -> Result<Net, ParseErr> {
    let mut net = Net::default();
    let mut decls = Vec::new();
    let mut evidence = Vec::new();
    for statement in statements {
        match statement {
            Statement::Network(name) => net.set_name(name),
            Statement::Variable(decl) => {
                net.add_variable(decl.name, &decl.states)?;
                decls.push(decl);
            }
            Statement::Evidence(var, state) => evidence.push((var, state)),
        }
    }
    for decl in &decls {
        for parent in &decl.parents {
            net.add_edge(parent, decl.name)?;
        }
    }
    for decl in decls {
        if let Some(table) = decl.table {
            net.set_probabilities(decl.name, table)?;
        }
    }
    for (var, state) in evidence {
        net.add_evidence(var, state)?;
    }
    log::debug!(
        "parsed network `{}` with {} variables",
        net.name(),
        net.variables().len()
    );
    Ok(net)
}

fn statements(input: &str) -> IResult<Vec<Statement>> {
    let (i, statements) = many0(alt((network_decl, variable_decl, evidence_decl)))(input)?;
    let (i, _) = multispace0::<_, ParseErrB>(i)?;
    if !i.is_empty() {
        return Err(nom::Err::Failure(ParseErrB::Nom(i, ErrorKind::Eof)));
    }
    Ok((i, statements))
}

// network = 'network' name ';' ;
fn network_decl(input: &str) -> IResult<Statement> {
    let (i, _) = keyword("network")(input)?;
    let (i, (name, _)) = cut(tuple((identifier, symbol(';', ";"))))(i)?;
    Ok((i, Statement::Network(name)))
}

// variable = 'variable' name states ['|' parents] ['=' table] ';' ;
fn variable_decl(input: &str) -> IResult<Statement> {
    let (i, _) = keyword("variable")(input)?;
    let (i, name) = cut(identifier)(i)?;
    let (i, states) = cut(list(identifier))(i)?;
    let (i, parents) = opt(preceded(
        symbol('|', "|"),
        cut(separated_list1(
            symbol(',', ","),
            preceded(multispace0, identifier),
        )),
    ))(i)?;
    let (i, table) = opt(preceded(symbol('=', "="), cut(list(number))))(i)?;
    let (i, _) = cut(symbol(';', ";"))(i)?;
    Ok((
        i,
        Statement::Variable(VarDecl {
            name,
            states,
            parents: parents.unwrap_or_default(),
            table,
        }),
    ))
}

// evidence = 'evidence' name '=' name ';' ;
fn evidence_decl(input: &str) -> IResult<Statement> {
    let (i, _) = keyword("evidence")(input)?;
    let (i, (var, _, _, state, _)) = cut(tuple((
        identifier,
        symbol('=', "="),
        multispace0,
        identifier,
        symbol(';', ";"),
    )))(i)?;
    Ok((i, Statement::Evidence(var, state)))
}

/// A keyword at the start of a statement, followed by at least one blank.
fn keyword<'a>(kw: &'static str) -> impl Fn(&'a str) -> IResult<'a, &'a str> {
    move |input: &'a str| {
        let (i, _) = multispace0::<_, ParseErrB>(input)?;
        let (i, word) = tag::<_, _, ParseErrB>(kw)(i)?;
        let (i, _) = multispace1::<_, ParseErrB>(i)?;
        Ok((i, word))
    }
}

/// A single character token, optionally preceded by blanks.
fn symbol<'a>(c: char, name: &'static str) -> impl Fn(&'a str) -> IResult<'a, char> {
    move |input: &'a str| {
        let (i, _) = multispace0::<_, ParseErrB>(input)?;
        char::<_, ParseErrB>(c)(i).map_err(|_| nom::Err::Error(ParseErrB::Expected(name, i)))
    }
}

// '[' item ${',' item}* ']'
fn list<'a, O, F>(item: F) -> impl FnMut(&'a str) -> IResult<'a, Vec<O>>
where
    F: FnMut(&'a str) -> IResult<'a, O>,
{
    delimited(
        symbol('[', "["),
        separated_list1(symbol(',', ","), preceded(multispace0, item)),
        symbol(']', "]"),
    )
}

fn identifier(input: &str) -> IResult<&str> {
    take_while1::<_, _, ParseErrB>(is_name_char)(input)
        .map_err(|_| nom::Err::Error(ParseErrB::Expected("name", input)))
}

fn number(input: &str) -> IResult<f64> {
    let expected = || nom::Err::Error(ParseErrB::Expected("number", input));
    let (i, digits) = take_while1::<_, _, ParseErrB>(|c: char| {
        c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || c == '-' || c == '+'
    })(input)
    .map_err(|_| expected())?;
    let n = f64::from_str(digits).map_err(|_| expected())?;
    Ok((i, n))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::net::test::sprinkler;
    use crate::NetError;

    const SPRINKLER: &str = include_str!("../../../demos/sprinkler.sbn");

    #[test]
    fn parse_variable() {
        let (rest, statement) =
            variable_decl(" variable wet-grass [yes, no] | a , b = [ 1, 0, 0.5,0.5 ];x").unwrap();
        assert_eq!(rest, "x");
        assert_eq!(
            statement,
            Statement::Variable(VarDecl {
                name: "wet-grass",
                states: vec!["yes", "no"],
                parents: vec!["a", "b"],
                table: Some(vec![1.0, 0.0, 0.5, 0.5]),
            })
        );

        let (_, statement) = variable_decl("variable a [x];").unwrap();
        assert_eq!(
            statement,
            Statement::Variable(VarDecl {
                name: "a",
                states: vec!["x"],
                parents: vec![],
                table: None,
            })
        );
    }

    #[test]
    fn parse_evidence_and_name() {
        assert_eq!(
            evidence_decl("evidence rain = true;"),
            Ok(("", Statement::Evidence("rain", "true")))
        );
        assert_eq!(
            network_decl("network alarm ;"),
            Ok(("", Statement::Network("alarm")))
        );
    }

    #[test]
    fn parse_sprinkler() {
        let net: Net = SPRINKLER.parse().unwrap();
        assert_eq!(net.name(), "sprinkler");
        assert_eq!(net.variables().len(), 4);
        assert!(net.validate().is_ok());
        let reference = sprinkler();
        for (parsed, built) in net.variables().iter().zip(reference.variables()) {
            assert_eq!(parsed.name(), built.name());
            assert_eq!(parsed.states(), built.states());
            assert_eq!(parsed.parents(), built.parents());
            assert_eq!(parsed.table(), built.table());
        }
        let evidence: Vec<_> = net.evidence_iter().collect();
        assert_eq!(evidence, vec![("wet_grass", "true")]);
    }

    #[test]
    fn forward_references() {
        let net = parse_net(
            "variable b [t, f] | a = [0.9, 0.1, 0.2, 0.8];
             variable a [t, f] = [0.3, 0.7];",
        )
        .unwrap();
        assert_eq!(net.variable("b").unwrap().parents(), &[1]);
    }

    #[test]
    fn write_then_parse() {
        let mut net = sprinkler();
        net.add_evidence("rain", "false").unwrap();
        let source = write_net(&net);
        let parsed = parse_net(&source).unwrap();
        assert_eq!(write_net(&parsed), source);
    }

    #[test]
    fn syntax_errors() {
        assert_eq!(
            parse_net("variable a [x, y] = [0.5, 0.5]").err(),
            Some(ParseErr::Expected {
                expected: ";",
                found: "end of input".into()
            })
        );
        assert_eq!(
            parse_net("variable a x, y];").err(),
            Some(ParseErr::Expected {
                expected: "[",
                found: "x, y];".into()
            })
        );
        assert_eq!(
            parse_net("variable a [x] = [0.5, abc];").err(),
            Some(ParseErr::Expected {
                expected: "]",
                found: ", abc];".into()
            })
        );
        assert_eq!(
            parse_net("varable a [x];").unwrap_err(),
            ParseErr::Syntax("varable a [x];".into())
        );
    }

    #[test]
    fn semantic_errors() {
        assert_eq!(
            parse_net("variable a [x, y] | b = [0.5, 0.5];").unwrap_err(),
            ParseErr::Net(NetError::UnknownVariable("b".into()))
        );
        assert!(matches!(
            parse_net("variable a [x, y] = [0.5, 0.6];"),
            Err(ParseErr::Net(NetError::RowNotNormalized { .. }))
        ));
        assert!(matches!(
            parse_net("variable a [x, y] = [0.5, 0.5]; evidence a = z;"),
            Err(ParseErr::Evidence(_))
        ));
    }

    #[test]
    fn written_names_parse_back() {
        let mut net = Net::new("My Garden");
        assert_eq!(net.name(), "my_garden");
        net.add_variable("Soil Moisture", &["Dry", "wet-ish"]).unwrap();
        net.set_probabilities("soil_moisture", vec![0.3, 0.7]).unwrap();
        assert_eq!(
            net.add_variable("temp.c", &["lo", "hi"]),
            Err(NetError::InvalidName("temp.c".into()))
        );

        let source = write_net(&net);
        let parsed = parse_net(&source).unwrap();
        assert_eq!(parsed.name(), "my_garden");
        assert_eq!(
            parsed.variable("soil_moisture").unwrap().states(),
            &["dry".to_owned(), "wet_ish".to_owned()]
        );
        assert_eq!(write_net(&parsed), source);
    }

    #[test]
    fn comments_are_ignored() {
        let net = parse_net(
            "# a single coin
             variable coin [heads, tails] = [0.5, 0.5]; # fair",
        )
        .unwrap();
        assert_eq!(net.variables().len(), 1);
    }
}
