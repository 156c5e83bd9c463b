//! Type spelling parser.
//!
//! Turns annotation-like spellings such as `Dict[str, List[Point]]` or
//! `typing.Optional[datetime.date]` into a [`DeclaredType`]. User record,
//! enumeration and type variable names are resolved through a [`TypeScope`].

use crate::error::{ParseError, SchemaError};
use crate::record::RecordType;
use crate::types::{DeclaredType, GenericKind, PrimitiveKind, TemporalKind};
use crate::validation::validate_enum;
use std::collections::HashMap;
use std::sync::Arc;
use treecast_core::EnumType;

/// Names available to the parser beyond the built-in ones.
#[derive(Debug, Default, Clone)]
pub struct TypeScope {
    names: HashMap<String, DeclaredType>,
}

impl TypeScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record type under its qualified and short name.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateType` if the qualified name is taken.
    pub fn register_record(&mut self, record: &Arc<RecordType>) -> Result<(), SchemaError> {
        self.register(
            &record.module,
            &record.name,
            DeclaredType::Record(Arc::clone(record)),
        )
    }

    /// Validates and registers an enumeration under its qualified and short
    /// name.
    ///
    /// # Errors
    /// Returns `SchemaError` if the enumeration is invalid or its qualified
    /// name is taken.
    pub fn register_enum(&mut self, enum_type: &Arc<EnumType>) -> Result<(), SchemaError> {
        validate_enum(enum_type)?;
        self.register(
            &enum_type.module,
            &enum_type.name,
            DeclaredType::Enum(Arc::clone(enum_type)),
        )
    }

    /// Registers a type variable with its constraints.
    ///
    /// # Errors
    /// Returns `SchemaError::DuplicateType` if the name is taken.
    pub fn register_type_var(
        &mut self,
        name: &str,
        constraints: Vec<DeclaredType>,
    ) -> Result<(), SchemaError> {
        if self.names.contains_key(name) {
            return Err(SchemaError::DuplicateType {
                name: name.to_string(),
            });
        }
        self.names.insert(
            name.to_string(),
            DeclaredType::TypeVar {
                name: name.to_string(),
                constraints,
            },
        );
        Ok(())
    }

    fn register(&mut self, module: &str, name: &str, ty: DeclaredType) -> Result<(), SchemaError> {
        if name.is_empty() {
            return Err(SchemaError::EmptyName {
                kind: "type",
                owner: module.to_string(),
            });
        }
        let qualified = format!("{module}.{name}");
        if self.names.contains_key(&qualified) {
            return Err(SchemaError::DuplicateType { name: qualified });
        }
        self.names.entry(name.to_string()).or_insert_with(|| ty.clone());
        self.names.insert(qualified, ty);
        Ok(())
    }

    /// Looks up a registered name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&DeclaredType> {
        self.names.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Open,
    Close,
    Comma,
    Ellipsis,
}

impl Token {
    fn text(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Open => "[",
            Self::Close => "]",
            Self::Comma => ",",
            Self::Ellipsis => "...",
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' | ']' | ',' => {
                chars.next();
                let token = match c {
                    '[' => Token::Open,
                    ']' => Token::Close,
                    _ => Token::Comma,
                };
                tokens.push((pos, token));
            }
            '.' if input[pos..].starts_with("...") => {
                chars.nth(2);
                tokens.push((pos, Token::Ellipsis));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = pos;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        end = i + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push((pos, Token::Name(input[pos..end].to_string())));
            }
            character => {
                return Err(ParseError::InvalidCharacter {
                    position: pos,
                    character,
                });
            }
        }
    }

    Ok(tokens)
}

enum Builtin {
    Plain(DeclaredType),
    Generic(GenericKind),
    Optional,
    Union,
}

fn builtin(name: &str) -> Option<Builtin> {
    let name = name
        .strip_prefix("typing.")
        .or_else(|| name.strip_prefix("builtins."))
        .or_else(|| name.strip_prefix("collections.abc."))
        .or_else(|| name.strip_prefix("collections."))
        .unwrap_or(name);

    let plain = match name {
        "Any" => DeclaredType::Any,
        "AnyStr" => DeclaredType::AnyStr,
        "bool" => DeclaredType::Primitive(PrimitiveKind::Bool),
        "int" => DeclaredType::Primitive(PrimitiveKind::Int),
        "float" => DeclaredType::Primitive(PrimitiveKind::Float),
        "None" | "NoneType" => DeclaredType::Primitive(PrimitiveKind::None),
        "str" => DeclaredType::Str,
        "bytes" => DeclaredType::Bytes,
        "bytearray" => DeclaredType::ByteArray,
        "datetime" | "datetime.datetime" => DeclaredType::Temporal(TemporalKind::DateTime),
        "date" | "datetime.date" => DeclaredType::Temporal(TemporalKind::Date),
        "time" | "datetime.time" => DeclaredType::Temporal(TemporalKind::Time),
        "timedelta" | "datetime.timedelta" => DeclaredType::Temporal(TemporalKind::Duration),
        "Optional" => return Some(Builtin::Optional),
        "Union" => return Some(Builtin::Union),
        other => return generic_kind(other).map(Builtin::Generic),
    };
    Some(Builtin::Plain(plain))
}

fn generic_kind(name: &str) -> Option<GenericKind> {
    let kind = match name {
        "List" | "list" => GenericKind::List,
        "Tuple" | "tuple" => GenericKind::Tuple,
        "Deque" | "deque" => GenericKind::Deque,
        "Set" | "set" => GenericKind::Set,
        "FrozenSet" | "frozenset" => GenericKind::FrozenSet,
        "Dict" | "dict" => GenericKind::Dict,
        "Mapping" => GenericKind::Mapping,
        "ChainMap" => GenericKind::ChainMap,
        "Sequence" => GenericKind::Sequence,
        _ => return None,
    };
    Some(kind)
}

struct Parser<'a> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    scope: &'a TypeScope,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self, expected: &str) -> Result<(usize, Token), ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ParseError::end(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, want: &Token, expected: &str) -> Result<(), ParseError> {
        let (position, token) = self.next(expected)?;
        if &token == want {
            Ok(())
        } else {
            Err(ParseError::unexpected(position, token.text(), expected))
        }
    }

    fn parse_type(&mut self) -> Result<DeclaredType, ParseError> {
        let (position, token) = self.next("a type name")?;
        let Token::Name(name) = token else {
            return Err(ParseError::unexpected(position, token.text(), "a type name"));
        };

        let args = if self.peek() == Some(&Token::Open) {
            self.pos += 1;
            Some(self.parse_args()?)
        } else {
            None
        };

        match (builtin(&name), args) {
            (Some(Builtin::Generic(origin)), None) => Ok(DeclaredType::Bare(origin)),
            (Some(Builtin::Generic(origin)), Some(args)) => build_generic(&name, origin, args),
            (Some(Builtin::Optional), Some(args)) => {
                let [inner] = <[Arg; 1]>::try_from(args).map_err(|args| ParseError::ArgumentCount {
                    name,
                    expected: "1".to_string(),
                    actual: args.len(),
                })?;
                Ok(DeclaredType::optional(inner.into_type()?))
            }
            (Some(Builtin::Union), Some(args)) => {
                let mut members = Vec::with_capacity(args.len());
                for arg in args {
                    let member = arg.into_type()?;
                    if !members.contains(&member) {
                        members.push(member);
                    }
                }
                match members.len() {
                    0 => Err(ParseError::ArgumentCount {
                        name,
                        expected: "at least 1".to_string(),
                        actual: 0,
                    }),
                    1 => Ok(members.remove(0)),
                    _ => Ok(DeclaredType::Union(members)),
                }
            }
            (Some(Builtin::Optional | Builtin::Union), None) => Err(ParseError::ArgumentCount {
                name,
                expected: "at least 1".to_string(),
                actual: 0,
            }),
            (Some(Builtin::Plain(ty)), None) => Ok(ty),
            (None, None) => Ok(self
                .scope
                .resolve(&name)
                .cloned()
                .unwrap_or(DeclaredType::Opaque(name))),
            (_, Some(_)) => Err(ParseError::NotSubscriptable { name }),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, ParseError> {
        let mut args = Vec::new();
        loop {
            if self.peek() == Some(&Token::Ellipsis) {
                self.pos += 1;
                args.push(Arg::Ellipsis);
            } else {
                args.push(Arg::Type(self.parse_type()?));
            }
            let (position, token) = self.next("',' or ']'")?;
            match token {
                Token::Comma => {}
                Token::Close => return Ok(args),
                other => return Err(ParseError::unexpected(position, other.text(), "',' or ']'")),
            }
        }
    }
}

enum Arg {
    Type(DeclaredType),
    Ellipsis,
}

impl Arg {
    fn into_type(self) -> Result<DeclaredType, ParseError> {
        match self {
            Self::Type(ty) => Ok(ty),
            Self::Ellipsis => Err(ParseError::end("a type argument instead of '...'")),
        }
    }
}

fn build_generic(name: &str, origin: GenericKind, args: Vec<Arg>) -> Result<DeclaredType, ParseError> {
    let count_error = |expected: &str, actual| ParseError::ArgumentCount {
        name: name.to_string(),
        expected: expected.to_string(),
        actual,
    };

    if origin == GenericKind::Tuple {
        return match args.as_slice() {
            [Arg::Type(_), Arg::Ellipsis] => {
                let mut args = args.into_iter();
                let item = args.next().map(Arg::into_type).transpose()?;
                item.map(DeclaredType::tuple)
                    .ok_or_else(|| count_error("1 or more", 0))
            }
            [] => Err(count_error("1 or more", 0)),
            _ => {
                let items = args
                    .into_iter()
                    .map(Arg::into_type)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DeclaredType::fixed_tuple(items))
            }
        };
    }

    if args.len() != origin.arity() {
        return Err(count_error(&origin.arity().to_string(), args.len()));
    }
    let args = args
        .into_iter()
        .map(Arg::into_type)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DeclaredType::Generic { origin, args })
}

/// Parses a type spelling.
///
/// # Arguments
/// * `spelling` - Annotation text such as `List[int]`
/// * `scope` - User types the spelling may refer to
///
/// # Errors
/// Returns `ParseError` if the spelling is malformed, subscripts a type that
/// takes no arguments or gives a generic the wrong number of arguments.
pub fn parse_type(spelling: &str, scope: &TypeScope) -> Result<DeclaredType, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(spelling)?,
        pos: 0,
        scope,
    };
    let ty = parser.parse_type()?;
    if let Some((position, token)) = parser.tokens.get(parser.pos) {
        return Err(ParseError::unexpected(*position, token.text(), "end of input"));
    }
    Ok(ty)
}
