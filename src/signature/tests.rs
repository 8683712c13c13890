use crate::proto::Type;

use super::{complete_type_len, Signature, SignatureError, TypeNode};

use SignatureError::*;

macro_rules! test {
    ($input:expr, $expected:pat) => {{
        let actual = Signature::new($input);

        assert!(
            matches!(actual, $expected),
            "{actual:?} does not match {}",
            stringify!($expected)
        );
    }};
}

#[test]
fn validation() {
    test!(b"", Ok(..));
    test!(b"sss", Ok(..));
    test!(b"i", Ok(..));
    test!(b"ai", Ok(..));
    test!(b"(i)", Ok(..));
    test!(b"(ii)a{sv}yyat", Ok(..));
    test!(b"a{s(iu)}", Ok(..));
    test!(b"aa{sv}", Ok(..));
    test!(b"w", Err(UnknownTypeCode(b'w')));
    test!(b" ", Err(UnknownTypeCode(..)));
    test!(b"a", Err(MissingArrayElementType));
    test!(b"aaaa", Err(MissingArrayElementType));
    test!(b"ii(ii)a", Err(MissingArrayElementType));
    test!(b")", Err(StructEndedButNotStarted));
    test!(b"i)", Err(StructEndedButNotStarted));
    test!(b"}", Err(DictEndedButNotStarted));
    test!(b"(", Err(StructStartedButNotEnded));
    test!(b"(iiii", Err(StructStartedButNotEnded));
    test!(b"()", Err(StructHasNoFields));
    test!(b"a()", Err(StructHasNoFields));
    test!(b"{si}", Err(DictEntryNotInsideArray));
    test!(b"({si})", Err(DictEntryNotInsideArray));
    test!(b"a{vs}", Err(DictKeyMustBeBasicType));
    test!(b"a{aii}", Err(DictKeyMustBeBasicType));
    test!(b"a{s}", Err(DictEntryHasOnlyOneField));
    test!(b"a{}", Err(DictEntryHasOnlyOneField));
    test!(b"a{sii}", Err(DictEntryHasTooManyFields));
    test!(b"a{si", Err(DictStartedButNotEnded));
}

#[test]
fn max_array_recursion() {
    let mut sig = vec![b'a'; 32];
    sig.push(b'i');
    test!(&sig[..], Ok(..));

    let mut sig = vec![b'a'; 33];
    sig.push(b'i');
    test!(&sig[..], Err(ExceededMaximumRecursion));
}

#[test]
fn too_long() {
    let sig = vec![b'i'; 256];
    test!(&sig[..], Err(SignatureTooLong));
}

#[test]
fn complete_types() -> Result<(), SignatureError> {
    assert_eq!(complete_type_len(b"ii", 0)?, 1);
    assert_eq!(complete_type_len(b"aai", 0)?, 3);
    assert_eq!(complete_type_len(b"a{s(iu)}x", 0)?, 8);
    assert_eq!(complete_type_len(b"(i(ss))x", 0)?, 7);
    assert_eq!(complete_type_len(b"vv", 1)?, 2);
    Ok(())
}

#[test]
fn iter_spans() -> Result<(), SignatureError> {
    let sig = Signature::new(b"ia{sv}(xt)v")?;
    let spans = sig.iter().map(|s| s.as_str()).collect::<Vec<_>>();
    assert_eq!(spans, ["i", "a{sv}", "(xt)", "v"]);
    assert_eq!(sig.arity(), 4);

    assert_eq!(Signature::EMPTY.iter().count(), 0);
    Ok(())
}

#[test]
fn parse_tree() -> Result<(), SignatureError> {
    let sig = Signature::new(b"ya{s(iu)}av")?;
    let nodes = sig.parse();

    assert_eq!(
        nodes,
        [
            TypeNode::Primitive(Type::BYTE),
            TypeNode::Dict(
                Box::new(TypeNode::Primitive(Type::STRING)),
                Box::new(TypeNode::Struct(vec![
                    TypeNode::Primitive(Type::INT32),
                    TypeNode::Primitive(Type::UINT32),
                ])),
            ),
            TypeNode::Array(Box::new(TypeNode::Variant)),
        ]
    );

    Ok(())
}

#[test]
fn parse_n_consumed() -> Result<(), SignatureError> {
    let sig = Signature::new(b"a{sv}iu")?;

    let (nodes, consumed) = sig.parse_n(1);
    assert_eq!(nodes.len(), 1);
    assert_eq!(consumed, 5);

    let (nodes, consumed) = sig.parse_n(0);
    assert!(nodes.is_empty());
    assert_eq!(consumed, 0);

    // Zero-length input consumes nothing and is not an error.
    let (nodes, consumed) = Signature::EMPTY.parse_n(usize::MAX);
    assert!(nodes.is_empty());
    assert_eq!(consumed, 0);
    Ok(())
}

#[test]
fn node_alignment() -> Result<(), SignatureError> {
    let nodes = Signature::new(b"ynix(y)a{sv}aiv")?.parse();
    let alignments = nodes.iter().map(|n| n.alignment()).collect::<Vec<_>>();
    assert_eq!(alignments, [1, 2, 4, 8, 8, 4, 4, 1]);
    Ok(())
}
