use crate::proto::Type;

/// A structured descriptor for one complete type in a signature.
///
/// Produced by [`Signature::parse`] and [`Signature::parse_n`]. Containers
/// nest recursively; a variant is a leaf whose concrete type is only known
/// once its wire data is read.
///
/// [`Signature::parse`]: crate::Signature::parse
/// [`Signature::parse_n`]: crate::Signature::parse_n
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNode {
    /// A primitive (basic) type.
    Primitive(Type),
    /// An array of one element type.
    Array(Box<TypeNode>),
    /// A struct with its member types in declared order.
    Struct(Vec<TypeNode>),
    /// A dict: an array of key-value entries. The key is restricted to
    /// basic types.
    Dict(Box<TypeNode>, Box<TypeNode>),
    /// A self-describing boxed value.
    Variant,
}

impl TypeNode {
    /// Alignment in bytes of a value of this type.
    ///
    /// Compound types take the alignment of their wire representation: 8 for
    /// structs and dict entries, 4 for the array length prefix, 1 for the
    /// variant's leading signature.
    pub fn alignment(&self) -> usize {
        match self {
            TypeNode::Primitive(ty) => ty.alignment(),
            TypeNode::Array(..) | TypeNode::Dict(..) => Type::ARRAY.alignment(),
            TypeNode::Struct(..) => Type::OPEN_PAREN.alignment(),
            TypeNode::Variant => Type::VARIANT.alignment(),
        }
    }

    /// Parse up to `limit` complete types from the start of a validated
    /// signature, returning the descriptors and the number of bytes
    /// consumed.
    pub(super) fn parse_prefix(bytes: &[u8], limit: usize) -> (Vec<TypeNode>, usize) {
        let mut nodes = Vec::new();
        let mut at = 0;

        while at < bytes.len() && nodes.len() < limit {
            let (node, end) = Self::parse_one(bytes, at);
            nodes.push(node);
            at = end;
        }

        (nodes, at)
    }

    /// Parse the single complete type starting at `at`.
    ///
    /// The input is a validated signature, so malformed spans are
    /// unreachable.
    fn parse_one(bytes: &[u8], at: usize) -> (TypeNode, usize) {
        match Type::new(bytes[at]) {
            Type::ARRAY => {
                if bytes[at + 1] == Type::OPEN_BRACE.get() {
                    let (key, n) = Self::parse_one(bytes, at + 2);
                    let (value, n) = Self::parse_one(bytes, n);
                    // n points at the closing brace.
                    (TypeNode::Dict(Box::new(key), Box::new(value)), n + 1)
                } else {
                    let (element, n) = Self::parse_one(bytes, at + 1);
                    (TypeNode::Array(Box::new(element)), n)
                }
            }
            Type::OPEN_PAREN => {
                let mut members = Vec::new();
                let mut n = at + 1;

                while bytes[n] != Type::CLOSE_PAREN.get() {
                    let (member, end) = Self::parse_one(bytes, n);
                    members.push(member);
                    n = end;
                }

                (TypeNode::Struct(members), n + 1)
            }
            Type::VARIANT => (TypeNode::Variant, at + 1),
            ty => (TypeNode::Primitive(ty), at + 1),
        }
    }
}
