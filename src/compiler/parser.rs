/*!

This module parses challenge source code.

Source code is line oriented. Blocks are delimited by indentation, so the text is first cut into
logical lines (comments and blank lines dropped, indentation measured), the lines are grouped into
blocks, and every line is then parsed on its own as a statement or a block header:

    ```
    <header>         ::=  'def' <name> '(' <name_list> ')' ':'
                       |  'class' <name> ( '(' ')' )? ':'
                       |  'if' <expr> ':' | 'elif' <expr> ':' | 'else' ':'
                       |  'while' <expr> ':' | 'for' <name> 'in' <expr> ':'
    <simple>         ::=  'return' <testlist>? | 'pass' | 'del' <name>
                       |  <name> <augmented_op> <testlist>
                       |  <target> '=' <testlist>
                       |  <testlist>
    <testlist>       ::=  <expr> ( ',' <expr> )* ','?
    <expr>           ::=  'not' <expr> | <comparison>
    <comparison>     ::=  <bitor> ( <compare_op> <bitor> )?
    <bitor>          ::=  <bitor> '|' <bitxor> | <bitxor>
    <bitxor>         ::=  <bitxor> '^' <bitand> | <bitand>
    <bitand>         ::=  <bitand> '&' <shift> | <shift>
    <shift>          ::=  <shift> ( '<<' | '>>' ) <arith> | <arith>
    <arith>          ::=  <arith> ( '+' | '-' ) <term> | <term>
    <term>           ::=  <term> ( '*' | '/' | '//' | '%' ) <factor> | <factor>
    <factor>         ::=  ( '-' | '+' | '~' ) <factor> | <power>
    <power>          ::=  <postfix> ( '**' <factor> )?
    <postfix>        ::=  <atom> ( '.' <name> | '(' <expr_list> ')' | '[' <testlist> ']' )*
    <atom>           ::=  '(' <expr_list> ')' | '[' <expr_list> ']' | <string> | <integer>
                       |  'None' | 'True' | 'False' | <name>
    ```

Special lexical forms, which are ignored:
    ```
    <eol_comment>     ::= '#' .* ('\n' | EOF)
    <whitespace>      ::= [ \t]+
    ```

Indentation must use spaces. Comparisons do not chain, and a block header must be alone on its
line.

*/

use nom::{
  branch::alt,
  bytes::complete::{tag, take_while},
  character::complete::{char as one_char, digit1, satisfy, space0, space1},
  combinator::{all_consuming, map, map_opt, map_res, not, opt, recognize, value, verify},
  error::{Error as NomError, ErrorKind},
  multi::{many0, separated_list0},
  sequence::{delimited, pair, preceded, terminated, tuple},
  Err as NomErr,
  IResult
};

use super::code::Constant;
use super::term::*;
use super::CompileError;

const KEYWORDS: [&str; 19] = [
  "and", "class", "def", "del", "elif", "else", "False", "for", "if", "in", "is", "lambda",
  "None", "not", "or", "pass", "return", "True", "while",
];

#[derive(Clone, Copy, Debug)]
struct SourceLine<'a> {
  number : u32,
  indent : usize,
  text   : &'a str,
}

/// The parse of one logical line. Block headers still lack their bodies.
#[derive(Clone, Debug)]
enum Header {
  Simple(StmtKind),
  Def {
    name   : Name,
    params : Vec<Name>
  },
  Class {
    name : Name
  },
  If(Expr),
  Elif(Expr),
  Else,
  While(Expr),
  For {
    target : Name,
    iter   : Expr
  },
}

struct Parser<'a> {
  lines    : Vec<SourceLine<'a>>,
  position : usize,
}


/// Parses source text to produce the abstract syntax tree of its top-level statements.
pub fn parse(source: &str) -> Result<Vec<Stmt>, CompileError> {
  let lines = logical_lines(source)?;
  let indent = match lines.first() {
    Some(line) => line.indent,
    None       => return Err(CompileError::Empty),
  };

  let mut parser = Parser { lines, position: 0 };
  let body = parser.parse_block(indent)?;

  // A line indented less than the first line is left over.
  match parser.peek() {
    Some(line) => Err(CompileError::UnexpectedIndent { line: line.number }),
    None       => Ok(body)
  }
}

/// Cuts the source into non-blank lines with comments removed.
fn logical_lines(source: &str) -> Result<Vec<SourceLine<'_>>, CompileError> {
  let mut lines = Vec::new();

  for (index, raw) in source.lines().enumerate() {
    let number = index as u32 + 1;
    let code   = strip_comment(raw).trim_end();
    let text   = code.trim_start_matches(|c| c == ' ' || c == '\t');
    if text.is_empty() {
      continue;
    }

    let leading = &code[..code.len() - text.len()];
    if leading.contains('\t') {
      return Err(CompileError::TabIndent { line: number });
    }

    lines.push(SourceLine { number, indent: leading.len(), text });
  }

  Ok(lines)
}

/// Removes a `#` comment, ignoring `#` inside string literals.
fn strip_comment(line: &str) -> &str {
  let mut quote: Option<char> = None;
  let mut escaped = false;

  for (index, c) in line.char_indices() {
    match quote {
      Some(q) => {
        if escaped {
          escaped = false;
        } else if c == '\\' {
          escaped = true;
        } else if c == q {
          quote = None;
        }
      }
      None => match c {
        '#'         => return &line[..index],
        '\'' | '"'  => quote = Some(c),
        _           => {}
      }
    }
  }
  line
}

impl<'a> Parser<'a> {

  fn peek(&self) -> Option<SourceLine<'a>> {
    self.lines.get(self.position).copied()
  }

  /// The number of the last line consumed.
  fn last_line(&self) -> u32 {
    self.lines[self.position - 1].number
  }

  /// Parses consecutive statements at exactly `indent`, stopping at the first dedent.
  fn parse_block(&mut self, indent: usize) -> Result<Vec<Stmt>, CompileError> {
    let mut body = Vec::new();

    while let Some(line) = self.peek() {
      if line.indent < indent {
        break;
      }
      if line.indent > indent {
        return Err(CompileError::UnexpectedIndent { line: line.number });
      }
      body.push(self.parse_statement()?);
    }

    Ok(body)
  }

  /// The indented block following a header line.
  fn parse_suite(&mut self, header: &SourceLine<'a>) -> Result<Vec<Stmt>, CompileError> {
    match self.peek() {
      Some(next) if next.indent > header.indent => self.parse_block(next.indent),
      _ => Err(CompileError::ExpectedIndent { line: header.number })
    }
  }

  fn parse_statement(&mut self) -> Result<Stmt, CompileError> {
    let line = self.lines[self.position];
    self.position += 1;

    let kind =
      match parse_header(&line)? {

        Header::Simple(kind) => kind,

        Header::Def { name, params } => {
          let body = self.parse_suite(&line)?;
          StmtKind::FunctionDef(Definition {
            name,
            params,
            body,
            first_line : line.number,
            last_line  : self.last_line()
          })
        }

        Header::Class { name } => {
          let body = self.parse_suite(&line)?;
          StmtKind::ClassDef(Definition {
            name,
            params     : Vec::new(),
            body,
            first_line : line.number,
            last_line  : self.last_line()
          })
        }

        Header::If(test) => self.parse_if(&line, test)?,

        Header::While(test) => {
          let body = self.parse_suite(&line)?;
          StmtKind::While { test, body }
        }

        Header::For { target, iter } => {
          let body = self.parse_suite(&line)?;
          StmtKind::For { target, iter, body }
        }

        Header::Elif(_) => {
          return Err(CompileError::DanglingElse { line: line.number, keyword: "elif" });
        }

        Header::Else => {
          return Err(CompileError::DanglingElse { line: line.number, keyword: "else" });
        }

      }; // end match on header

    Ok(Stmt { line: line.number, kind })
  }

  /// Parses the body of an `if` or `elif` and any `elif`/`else` continuing it.
  fn parse_if(&mut self, header: &SourceLine<'a>, test: Expr) -> Result<StmtKind, CompileError> {
    let body = self.parse_suite(header)?;
    let mut orelse = Vec::new();

    if let Some(next) = self.peek() {
      if next.indent == header.indent {
        match parse_header(&next)? {

          Header::Elif(test) => {
            self.position += 1;
            let kind = self.parse_if(&next, test)?;
            orelse.push(Stmt { line: next.number, kind });
          }

          Header::Else => {
            self.position += 1;
            orelse = self.parse_suite(&next)?;
          }

          _ => {}

        }
      }
    }

    Ok(StmtKind::If { test, body, orelse })
  }
}

fn parse_header(line: &SourceLine<'_>) -> Result<Header, CompileError> {
  match all_consuming(pheader)(line.text) {

    Ok((_, header)) => Ok(header),

    | Err(NomErr::Error(error))
    | Err(NomErr::Failure(error)) => {
      let near = match error.input.is_empty() {
        true  => "end of line".to_string(),
        false => error.input.to_string()
      };
      Err(CompileError::Syntax { line: line.number, near })
    }

    Err(NomErr::Incomplete(_)) => {
      Err(CompileError::Syntax { line: line.number, near: line.text.to_string() })
    }

  }
}

// region Combinator helpers

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
  where
  F: FnMut(&'a str) -> IResult<&'a str, O>,
{
  delimited(space0, inner, space0)
}

fn is_name_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Matches `word` only when it is not the prefix of a longer name.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
  terminated(tag(word), not(satisfy(is_name_char)))
}

/// Matches a single operator character that is not the start of an augmented assignment.
fn operator<'a>(symbol: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
  ws(terminated(tag(symbol), not(one_char('='))))
}

/**
  Parses `operand (operator operand)*` and folds it to the left. `operator` failing with a
  recoverable error ends the sequence.
*/
fn left_assoc<'a>(
  input    : &'a str,
  operand  : fn(&'a str) -> IResult<&'a str, Expr>,
  operator : fn(&'a str) -> IResult<&'a str, BinaryOp>,
) -> IResult<&'a str, Expr>
{
  let (mut input, mut left) = operand(input)?;
  loop {
    match pair(operator, operand)(input) {
      Ok((rest, (op, right))) => {
        left  = Expr::binary(op, left, right);
        input = rest;
      }
      Err(NomErr::Error(_)) => return Ok((input, left)),
      Err(error)            => return Err(error)
    }
  }
}

// endregion

// region Statements

fn pheader(text: &str) -> IResult<&str, Header> {
  delimited(
    space0,
    alt((
      pdef,
      pclass,
      map(delimited(keyword("if"), pexpr, ws(one_char(':'))), Header::If),
      map(delimited(keyword("elif"), pexpr, ws(one_char(':'))), Header::Elif),
      value(Header::Else, terminated(keyword("else"), ws(one_char(':')))),
      map(delimited(keyword("while"), pexpr, ws(one_char(':'))), Header::While),
      pfor,
      map(psimple, Header::Simple),
    )),
    space0
  )(text)
}

/// `def <name> '(' <name_list> ')' ':'`
fn pdef(text: &str) -> IResult<&str, Header> {
  map(
    tuple((
      keyword("def"),
      ws(pname),
      delimited(ws(one_char('(')), pname_list, ws(one_char(')'))),
      ws(one_char(':'))
    )),
    |(_, name, params, _)| Header::Def { name, params }
  )(text)
}

/// `class <name> ( '(' ')' )? ':'`
fn pclass(text: &str) -> IResult<&str, Header> {
  map(
    tuple((
      keyword("class"),
      ws(pname),
      opt(pair(ws(one_char('(')), ws(one_char(')')))),
      ws(one_char(':'))
    )),
    |(_, name, _, _)| Header::Class { name }
  )(text)
}

/// `for <name> in <expr> ':'`
fn pfor(text: &str) -> IResult<&str, Header> {
  map(
    tuple((keyword("for"), ws(pname), keyword("in"), pexpr, ws(one_char(':')))),
    |(_, target, _, iter, _)| Header::For { target, iter }
  )(text)
}

fn pname_list(text: &str) -> IResult<&str, Vec<Name>> {
  terminated(
    separated_list0(ws(one_char(',')), ws(pname)),
    opt(ws(one_char(',')))
  )(text)
}

fn psimple(text: &str) -> IResult<&str, StmtKind> {
  alt((
    map(
      preceded(keyword("return"), opt(preceded(space1, ptestlist))),
      StmtKind::Return
    ),
    value(StmtKind::Pass, keyword("pass")),
    map(preceded(pair(keyword("del"), space1), pname), StmtKind::Delete),
    paugmented_assign,
    passign,
    map(ptestlist, StmtKind::Expr),
  ))(text)
}

fn paugmented_assign(text: &str) -> IResult<&str, StmtKind> {
  map(
    tuple((pname, ws(paugmented_op), ptestlist)),
    |(name, op, value)| StmtKind::AugAssign { name, op, value }
  )(text)
}

fn paugmented_op(text: &str) -> IResult<&str, BinaryOp> {
  alt((
    value(BinaryOp::Power,       tag("**=")),
    value(BinaryOp::FloorDivide, tag("//=")),
    value(BinaryOp::Lshift,      tag("<<=")),
    value(BinaryOp::Rshift,      tag(">>=")),
    value(BinaryOp::Add,         tag("+=")),
    value(BinaryOp::Subtract,    tag("-=")),
    value(BinaryOp::Multiply,    tag("*=")),
    value(BinaryOp::TrueDivide,  tag("/=")),
    value(BinaryOp::Modulo,      tag("%=")),
    value(BinaryOp::And,         tag("&=")),
    value(BinaryOp::Or,          tag("|=")),
    value(BinaryOp::Xor,         tag("^=")),
  ))(text)
}

fn passign(text: &str) -> IResult<&str, StmtKind> {
  map(
    tuple((
      map_opt(ppostfix, into_target),
      ws(terminated(one_char('='), not(one_char('=')))),
      ptestlist
    )),
    |(target, _, value)| StmtKind::Assign { target, value }
  )(text)
}

fn into_target(expr: Expr) -> Option<Target> {
  match expr {
    Expr::Name(name)                => Some(Target::Name(name)),
    Expr::Attribute { value, attr } => Some(Target::Attribute { value: *value, attr }),
    Expr::Subscript { value, index } => Some(Target::Subscript { value: *value, index: *index }),
    _                               => None
  }
}

// endregion

// region Expressions

/// `<expr> ( ',' <expr> )* ','?`, a tuple unless it is a single expression without a comma.
pub fn ptestlist(text: &str) -> IResult<&str, Expr> {
  let (rest, first)    = pexpr(text)?;
  let (rest, more)     = many0(preceded(ws(one_char(',')), pexpr))(rest)?;
  let (rest, trailing) = opt(ws(one_char(',')))(rest)?;

  match more.is_empty() && trailing.is_none() {
    true  => Ok((rest, first)),
    false => {
      let mut items = vec![first];
      items.extend(more);
      Ok((rest, Expr::Tuple(items)))
    }
  }
}

pub fn pexpr(text: &str) -> IResult<&str, Expr> {
  alt((
    map(
      preceded(ws(keyword("not")), pexpr),
      |operand| Expr::unary(UnaryOp::Not, operand)
    ),
    pcomparison
  ))(text)
}

fn pcomparison(text: &str) -> IResult<&str, Expr> {
  let (rest, left) = pbitor(text)?;
  match pair(pcompare_op, pbitor)(rest) {
    Ok((rest, (op, right))) => Ok((rest, Expr::compare(op, left, right))),
    Err(NomErr::Error(_))   => Ok((rest, left)),
    Err(error)              => Err(error)
  }
}

fn pcompare_op(text: &str) -> IResult<&str, CompareOp> {
  ws(alt((
    value(CompareOp::LessEqual,    tag("<=")),
    value(CompareOp::GreaterEqual, tag(">=")),
    value(CompareOp::Equal,        tag("==")),
    value(CompareOp::NotEqual,     tag("!=")),
    value(CompareOp::Less,         tag("<")),
    value(CompareOp::Greater,      tag(">")),
    value(CompareOp::IsNot,        tuple((keyword("is"), space1, keyword("not")))),
    value(CompareOp::Is,           keyword("is")),
    value(CompareOp::NotIn,        tuple((keyword("not"), space1, keyword("in")))),
    value(CompareOp::In,           keyword("in")),
  )))(text)
}

fn pbitor(text: &str) -> IResult<&str, Expr> {
  left_assoc(text, pbitxor, |i| value(BinaryOp::Or, operator("|"))(i))
}

fn pbitxor(text: &str) -> IResult<&str, Expr> {
  left_assoc(text, pbitand, |i| value(BinaryOp::Xor, operator("^"))(i))
}

fn pbitand(text: &str) -> IResult<&str, Expr> {
  left_assoc(text, pshift, |i| value(BinaryOp::And, operator("&"))(i))
}

fn pshift(text: &str) -> IResult<&str, Expr> {
  left_assoc(text, parith, |i| {
    alt((
      value(BinaryOp::Lshift, operator("<<")),
      value(BinaryOp::Rshift, operator(">>")),
    ))(i)
  })
}

fn parith(text: &str) -> IResult<&str, Expr> {
  left_assoc(text, pterm, |i| {
    alt((
      value(BinaryOp::Add,      operator("+")),
      value(BinaryOp::Subtract, operator("-")),
    ))(i)
  })
}

fn pterm(text: &str) -> IResult<&str, Expr> {
  left_assoc(text, pfactor, |i| {
    alt((
      value(BinaryOp::FloorDivide, operator("//")),
      value(BinaryOp::TrueDivide,  operator("/")),
      value(BinaryOp::Modulo,      operator("%")),
      value(BinaryOp::Multiply,    ws(terminated(one_char('*'), not(one_char('*'))))),
    ))(i)
  })
}

fn pfactor(text: &str) -> IResult<&str, Expr> {
  alt((
    map(
      pair(
        ws(alt((
          value(UnaryOp::Negative, one_char('-')),
          value(UnaryOp::Positive, one_char('+')),
          value(UnaryOp::Invert,   one_char('~')),
        ))),
        pfactor
      ),
      |(op, operand)| Expr::unary(op, operand)
    ),
    ppower
  ))(text)
}

/// `**` is right associative and binds tighter than a unary operator on its left.
fn ppower(text: &str) -> IResult<&str, Expr> {
  let (rest, base) = ppostfix(text)?;
  match preceded(ws(tag("**")), pfactor)(rest) {
    Ok((rest, exponent))  => Ok((rest, Expr::binary(BinaryOp::Power, base, exponent))),
    Err(NomErr::Error(_)) => Ok((rest, base)),
    Err(error)            => Err(error)
  }
}

enum Trailer {
  Attribute(Name),
  Call(Vec<Expr>),
  Subscript(Expr),
}

fn ppostfix(text: &str) -> IResult<&str, Expr> {
  let (mut input, mut expr) = patom(text)?;
  loop {
    match ptrailer(input) {
      Ok((rest, trailer)) => {
        expr = match trailer {
          Trailer::Attribute(attr) => Expr::Attribute { value: Box::new(expr), attr },
          Trailer::Call(args)      => Expr::Call { func: Box::new(expr), args },
          Trailer::Subscript(index) => {
            Expr::Subscript { value: Box::new(expr), index: Box::new(index) }
          }
        };
        input = rest;
      }
      Err(NomErr::Error(_)) => return Ok((input, expr)),
      Err(error)            => return Err(error)
    }
  }
}

fn ptrailer(text: &str) -> IResult<&str, Trailer> {
  ws(alt((
    map(preceded(ws(one_char('.')), pname), Trailer::Attribute),
    map(delimited(ws(one_char('(')), pexpr_list, one_char(')')), Trailer::Call),
    map(delimited(ws(one_char('[')), ptestlist, one_char(']')), Trailer::Subscript),
  )))(text)
}

fn pexpr_list(text: &str) -> IResult<&str, Vec<Expr>> {
  terminated(
    separated_list0(ws(one_char(',')), pexpr),
    opt(ws(one_char(',')))
  )(text)
}

fn patom(text: &str) -> IResult<&str, Expr> {
  ws(alt((
    pparenthesized,
    map(delimited(ws(one_char('[')), pexpr_list, one_char(']')), Expr::List),
    map(pstring, |text| Expr::Constant(Constant::Str(text))),
    map(pinteger, Expr::integer),
    value(Expr::Constant(Constant::None),        keyword("None")),
    value(Expr::Constant(Constant::Bool(true)),  keyword("True")),
    value(Expr::Constant(Constant::Bool(false)), keyword("False")),
    map(pname, Expr::Name),
  )))(text)
}

/// A parenthesized expression, or a tuple when there is a comma or nothing inside.
fn pparenthesized(text: &str) -> IResult<&str, Expr> {
  let (rest, _)        = ws(one_char('('))(text)?;
  let (rest, items)    = separated_list0(ws(one_char(',')), pexpr)(rest)?;
  let (rest, trailing) = opt(ws(one_char(',')))(rest)?;
  let (rest, _)        = one_char(')')(rest)?;

  let mut items = items;
  match (items.len(), trailing) {
    (1, None) => Ok((rest, items.remove(0))),
    _         => Ok((rest, Expr::Tuple(items)))
  }
}

fn pname(text: &str) -> IResult<&str, Name> {
  map(
    verify(
      recognize(pair(satisfy(|c: char| c.is_alphabetic() || c == '_'), take_while(is_name_char))),
      |name: &str| !KEYWORDS.contains(&name)
    ),
    |name: &str| Name::from(name)
  )(text)
}

/// Decimal integers, with `_` allowed between digit groups.
fn pinteger(text: &str) -> IResult<&str, i64> {
  map_res(
    terminated(
      recognize(pair(digit1, many0(pair(one_char('_'), digit1)))),
      not(satisfy(is_name_char))
    ),
    |digits: &str| digits.replace('_', "").parse::<i64>()
  )(text)
}

/// A single or double quoted string literal with backslash escapes.
fn pstring(text: &str) -> IResult<&str, String> {
  let quote = match text.chars().next() {
    Some(quote @ ('\'' | '"')) => quote,
    _ => return Err(NomErr::Error(NomError::new(text, ErrorKind::Char)))
  };

  let mut value = String::new();
  let mut chars = text.char_indices().skip(1);
  while let Some((index, c)) = chars.next() {
    match c {
      c if c == quote => return Ok((&text[index + c.len_utf8()..], value)),
      '\\' => match chars.next() {
        Some((_, 'n'))   => value.push('\n'),
        Some((_, 't'))   => value.push('\t'),
        Some((_, '0'))   => value.push('\0'),
        Some((_, '\\'))  => value.push('\\'),
        Some((_, '\''))  => value.push('\''),
        Some((_, '"'))   => value.push('"'),
        Some((_, other)) => {
          value.push('\\');
          value.push(other);
        }
        None => break
      },
      c => value.push(c)
    }
  }

  // An unterminated literal cannot be anything else.
  Err(NomErr::Failure(NomError::new(text, ErrorKind::Char)))
}

// endregion


#[cfg(test)]
mod tests {
  use super::*;

  fn expr(text: &str) -> Expr {
    let (_, expr) = all_consuming(ptestlist)(text).unwrap();
    expr
  }

  fn body_of(stmts: &[Stmt]) -> &Definition {
    match &stmts[0].kind {
      StmtKind::FunctionDef(definition) | StmtKind::ClassDef(definition) => definition,
      other => panic!("not a definition: {:?}", other)
    }
  }

  #[test]
  fn arithmetic_precedence() {
    assert_eq!(
      expr("a + b * c"),
      Expr::binary(
        BinaryOp::Add,
        Expr::name("a"),
        Expr::binary(BinaryOp::Multiply, Expr::name("b"), Expr::name("c"))
      )
    );
    assert_eq!(
      expr("a - b - c"),
      Expr::binary(
        BinaryOp::Subtract,
        Expr::binary(BinaryOp::Subtract, Expr::name("a"), Expr::name("b")),
        Expr::name("c")
      )
    );
  }

  #[test]
  fn power_binds_tighter_than_unary_minus() {
    assert_eq!(
      expr("-x ** 2"),
      Expr::unary(
        UnaryOp::Negative,
        Expr::binary(BinaryOp::Power, Expr::name("x"), Expr::integer(2))
      )
    );
    assert_eq!(
      expr("2 ** 3 ** 2"),
      Expr::binary(
        BinaryOp::Power,
        Expr::integer(2),
        Expr::binary(BinaryOp::Power, Expr::integer(3), Expr::integer(2))
      )
    );
  }

  #[test]
  fn floor_division_and_power_are_not_split() {
    assert_eq!(
      expr("a // b * c"),
      Expr::binary(
        BinaryOp::Multiply,
        Expr::binary(BinaryOp::FloorDivide, Expr::name("a"), Expr::name("b")),
        Expr::name("c")
      )
    );
  }

  #[test]
  fn comparisons_and_not() {
    assert_eq!(
      expr("not a is not None"),
      Expr::unary(
        UnaryOp::Not,
        Expr::compare(CompareOp::IsNot, Expr::name("a"), Expr::Constant(Constant::None))
      )
    );
    assert_eq!(
      expr("x not in items"),
      Expr::compare(CompareOp::NotIn, Expr::name("x"), Expr::name("items"))
    );
    assert_eq!(
      expr("i <= 3"),
      Expr::compare(CompareOp::LessEqual, Expr::name("i"), Expr::integer(3))
    );
  }

  #[test]
  fn postfix_chains() {
    assert_eq!(
      expr("s.upper()[0]"),
      Expr::Subscript {
        value: Box::new(Expr::Call {
          func: Box::new(Expr::Attribute { value: Box::new(Expr::name("s")), attr: "upper".into() }),
          args: vec![]
        }),
        index: Box::new(Expr::integer(0))
      }
    );
  }

  #[test]
  fn tuples_and_lists() {
    assert_eq!(expr("1, 2"), Expr::Tuple(vec![Expr::integer(1), Expr::integer(2)]));
    assert_eq!(expr("(1,)"), Expr::Tuple(vec![Expr::integer(1)]));
    assert_eq!(expr("(1)"), Expr::integer(1));
    assert_eq!(expr("()"), Expr::Tuple(vec![]));
    assert_eq!(expr("[x, 'y']"),
               Expr::List(vec![Expr::name("x"), Expr::Constant(Constant::Str("y".to_string()))]));
  }

  #[test]
  fn string_escapes_and_comments() {
    let stmts = parse("def f():\n    return 'a # b\\n'  # comment\n").unwrap();
    let definition = body_of(&stmts);
    assert_eq!(
      definition.body[0].kind,
      StmtKind::Return(Some(Expr::Constant(Constant::Str("a # b\n".to_string()))))
    );
  }

  #[test]
  fn integers_allow_digit_groups() {
    assert_eq!(expr("1_000"), Expr::integer(1000));
  }

  #[test]
  fn blocks_nest_by_indentation() {
    let source = "\
def outer(x):
    def inner(y):
        return y

    if x:
        pass
    elif x > 1:
        x += 1
    else:
        del x
    return inner
";
    let stmts = parse(source).unwrap();
    assert_eq!(stmts.len(), 1);

    let outer = body_of(&stmts);
    assert_eq!(outer.params, vec![Name::from("x")]);
    assert_eq!((outer.first_line, outer.last_line), (1, 11));
    assert_eq!(outer.body.len(), 3);

    let inner = body_of(&outer.body);
    assert_eq!((inner.first_line, inner.last_line), (2, 3));

    match &outer.body[1].kind {
      StmtKind::If { orelse, .. } => {
        assert_eq!(orelse.len(), 1);
        assert_eq!(orelse[0].line, 7);
        match &orelse[0].kind {
          StmtKind::If { orelse, .. } => {
            assert_eq!(orelse[0].kind, StmtKind::Delete("x".into()));
          }
          other => panic!("expected elif, got {:?}", other)
        }
      }
      other => panic!("expected if, got {:?}", other)
    }
  }

  #[test]
  fn assignment_targets() {
    let stmts = parse("def f(p):\n    p.x = 1\n    p[0] = 2\n    y = p == 3\n").unwrap();
    let body = &body_of(&stmts).body;
    assert!(matches!(body[0].kind, StmtKind::Assign { target: Target::Attribute { .. }, .. }));
    assert!(matches!(body[1].kind, StmtKind::Assign { target: Target::Subscript { .. }, .. }));
    assert!(matches!(
      body[2].kind,
      StmtKind::Assign { target: Target::Name(_), value: Expr::Compare { .. } }
    ));
  }

  #[test]
  fn missing_block_is_reported() {
    assert_eq!(parse("def f():\nreturn 1\n"), Err(CompileError::ExpectedIndent { line: 1 }));
  }

  #[test]
  fn stray_indent_is_reported() {
    assert_eq!(
      parse("def f():\n    x = 1\n        y = 2\n"),
      Err(CompileError::UnexpectedIndent { line: 3 })
    );
  }

  #[test]
  fn tabs_are_rejected() {
    assert_eq!(parse("def f():\n\treturn 1\n"), Err(CompileError::TabIndent { line: 2 }));
  }

  #[test]
  fn dangling_else_is_reported() {
    assert_eq!(
      parse("def f():\n    else:\n        pass\n"),
      Err(CompileError::DanglingElse { line: 2, keyword: "else" })
    );
  }

  #[test]
  fn chained_comparison_is_a_syntax_error() {
    assert!(matches!(
      parse("def f(a, b, c):\n    return a < b < c\n"),
      Err(CompileError::Syntax { line: 2, .. })
    ));
  }

  #[test]
  fn unterminated_string_is_a_syntax_error() {
    assert!(matches!(
      parse("def f():\n    return 'abc\n"),
      Err(CompileError::Syntax { line: 2, .. })
    ));
  }

  #[test]
  fn empty_source() {
    assert_eq!(parse("\n  # nothing\n"), Err(CompileError::Empty));
  }
}
