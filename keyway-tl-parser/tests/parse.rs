use keyway_tl_parser::{parse_listing, FlagRef, Kind, ParamType, ParseError, TypeExpr, TypeSchema};

#[test]
fn parses_handshake_constructor() {
    let src = "resPQ#05162463 nonce:int128 server_nonce:int128 pq:bytes \
               server_public_key_fingerprints:Vector<long> = ResPQ";
    let schema: TypeSchema = src.parse().unwrap();
    assert_eq!(schema.id, 0x05162463);
    assert_eq!(schema.name, "resPQ");
    assert_eq!(schema.result_type, "ResPQ");
    assert_eq!(schema.params.len(), 4);
    assert_eq!(
        schema.params[3].value_type(),
        Some(&TypeExpr::Vector { boxed: true, item: Box::new(TypeExpr::Long) })
    );
}

#[test]
fn parses_flagged_parameters() {
    let schema: TypeSchema =
        "x#11223344 flags:# big:flags.0?true count:flags.1?int id:long = X".parse().unwrap();
    assert_eq!(schema.params[0].ty, ParamType::Mask);
    assert_eq!(
        schema.params[1].ty,
        ParamType::Value {
            ty: TypeExpr::True,
            flag: Some(FlagRef { mask: "flags".into(), bit: 0 }),
        }
    );
    assert_eq!(schema.params[3].flag(), None);
}

#[test]
fn classifies_named_types() {
    let schema: TypeSchema =
        "w#1 a:Server_DH_Params b:ns.innerThing c:vector<bytes> = W".parse().unwrap();
    assert_eq!(
        schema.params[0].value_type(),
        Some(&TypeExpr::Named { name: "Server_DH_Params".into(), bare: false })
    );
    assert_eq!(
        schema.params[1].value_type(),
        Some(&TypeExpr::Named { name: "ns.innerThing".into(), bare: true })
    );
    assert_eq!(
        schema.params[2].value_type(),
        Some(&TypeExpr::Vector { boxed: false, item: Box::new(TypeExpr::Bytes) })
    );
}

#[test]
fn listing_switches_to_functions() {
    let src = "
// handshake types
resPQ#05162463 nonce:int128 server_nonce:int128 pq:bytes
    server_public_key_fingerprints:Vector<long> = ResPQ;
--functions--
req_pq_multi#be7e8ef1 nonce:int128 = ResPQ; // current
";
    let defs: Vec<_> = parse_listing(src).collect::<Result<_, _>>().unwrap();
    assert_eq!(defs.len(), 2);
    assert_eq!(defs[0].kind, Kind::Constructor);
    assert_eq!(defs[0].params.len(), 4);
    assert_eq!(defs[1].kind, Kind::Function);
    assert_eq!(defs[1].name, "req_pq_multi");
}

#[test]
fn derives_missing_id() {
    let defs: Vec<_> = parse_listing("boolFalse = Bool;").collect::<Result<_, _>>().unwrap();
    assert_eq!(defs[0].id, 0xbc799737);
}

#[test]
fn rejects_malformed_descriptors() {
    assert_eq!("".parse::<TypeSchema>(), Err(ParseError::Empty));
    assert_eq!("x#1 a:int".parse::<TypeSchema>(), Err(ParseError::MissingResultType));
    assert!(matches!("x#nothex = X".parse::<TypeSchema>(), Err(ParseError::InvalidId(_))));
    assert!(matches!("x#1 a = X".parse::<TypeSchema>(), Err(ParseError::InvalidParam(_))));
    assert!(matches!("x#1 {X:Type} q:!X = X".parse::<TypeSchema>(), Err(ParseError::InvalidParam(_))));
    assert!(matches!("x#1 a:flags.x?int = X".parse::<TypeSchema>(), Err(ParseError::InvalidParam(_))));
}
