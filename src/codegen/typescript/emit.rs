use std::cell::Cell;

use swc_common::{
    BytePos, DUMMY_SP, SourceMap, Span,
    comments::{Comment, CommentKind, Comments, SingleThreadedComments},
    sync::Lrc,
};
use swc_ecma_ast::{
    Bool, Decl, ExportDecl, ExportNamedSpecifier, ExportSpecifier, Expr, Ident, ImportDecl,
    ImportPhase, ImportSpecifier, ImportStarAsSpecifier, Lit, Module, ModuleDecl,
    ModuleExportName, ModuleItem, NamedExport, Number, Str, TsArrayType, TsEntityName,
    TsInterfaceBody, TsInterfaceDecl, TsIntersectionType, TsKeywordType, TsKeywordTypeKind, TsLit,
    TsLitType, TsParenthesizedType, TsPropertySignature, TsType, TsTypeAliasDecl, TsTypeAnn,
    TsTypeElement, TsTypeLit, TsTypeParamInstantiation, TsTypeRef, TsUnionOrIntersectionType,
    TsUnionType,
};
use swc_ecma_codegen::{Emitter, text_writer::JsWriter};

use crate::codegen::is_ts_ident;

// MARK: Comments

/// Bundles a [`SingleThreadedComments`] store with a [`BytePos`] counter
/// for allocating unique spans to attach JSDoc comments.
pub struct TsComments {
    comments: SingleThreadedComments,
    next_pos: Cell<u32>,
}

impl TsComments {
    pub fn new() -> Self {
        Self {
            comments: SingleThreadedComments::default(),
            // Start at 1 to avoid `BytePos(0)`, which is `DUMMY_SP.lo`.
            next_pos: Cell::new(1),
        }
    }

    /// Allocates a unique span, optionally attaching a leading JSDoc
    /// comment (`/** description */`).
    pub fn span_with_jsdoc(&self, desc: Option<&str>) -> Span {
        let pos = self.next_pos.get();
        self.next_pos.set(pos + 1);
        let lo = BytePos(pos);
        let span = Span::new(lo, lo);

        if let Some(desc) = desc {
            self.comments.add_leading(
                lo,
                Comment {
                    kind: CommentKind::Block,
                    span: DUMMY_SP,
                    // A `*/` in the description would end the comment early.
                    text: format!("* {} ", desc.trim().replace("*/", "*\\/")).into(),
                },
            );
        }

        span
    }
}

/// Creates an [`Ident`] with `DUMMY_SP` and no syntax context.
pub fn ident(name: &str) -> Ident {
    Ident::new_no_ctxt(name.into(), DUMMY_SP)
}

fn str_lit(value: &str) -> Str {
    Str {
        span: DUMMY_SP,
        value: value.into(),
        raw: None,
    }
}

// MARK: Type constructors

/// Creates a keyword type like `string`, `number`, `boolean`,
/// `unknown`, or `null`.
pub fn kw(kind: TsKeywordTypeKind) -> Box<TsType> {
    Box::new(TsType::TsKeywordType(TsKeywordType {
        span: DUMMY_SP,
        kind,
    }))
}

/// Creates a string literal type like `"active"`.
pub fn lit_str(s: &str) -> Box<TsType> {
    Box::new(TsType::TsLitType(TsLitType {
        span: DUMMY_SP,
        lit: TsLit::Str(str_lit(s)),
    }))
}

/// Creates a number literal type like `42`, keeping the source text.
pub fn lit_num(n: &serde_json::Number) -> Box<TsType> {
    let raw = n.to_string();
    Box::new(TsType::TsLitType(TsLitType {
        span: DUMMY_SP,
        lit: TsLit::Number(Number {
            span: DUMMY_SP,
            value: n.as_f64().unwrap_or_default(),
            raw: Some(raw.into()),
        }),
    }))
}

pub fn lit_bool(b: bool) -> Box<TsType> {
    Box::new(TsType::TsLitType(TsLitType {
        span: DUMMY_SP,
        lit: TsLit::Bool(Bool {
            span: DUMMY_SP,
            value: b,
        }),
    }))
}

/// Creates an array type `T[]`, wrapping union and intersection
/// element types in parentheses to preserve precedence.
pub fn array(elem: Box<TsType>) -> Box<TsType> {
    // SWC doesn't parenthesize union and intersection element types,
    // so `(A | B)[]` would otherwise emit as `A | B[]`.
    let elem = match *elem {
        TsType::TsUnionOrIntersectionType(_) => {
            Box::new(TsType::TsParenthesizedType(TsParenthesizedType {
                span: DUMMY_SP,
                type_ann: elem,
            }))
        }
        _ => elem,
    };
    Box::new(TsType::TsArrayType(TsArrayType {
        span: DUMMY_SP,
        elem_type: elem,
    }))
}

/// Creates a `Record<string, T>` type reference.
pub fn record(value: Box<TsType>) -> Box<TsType> {
    Box::new(TsType::TsTypeRef(TsTypeRef {
        span: DUMMY_SP,
        type_name: TsEntityName::Ident(ident("Record")),
        type_params: Some(Box::new(TsTypeParamInstantiation {
            span: DUMMY_SP,
            params: vec![kw(TsKeywordTypeKind::TsStringKeyword), value],
        })),
    }))
}

/// Creates a union type `A | B | C`, flattening nested unions and
/// dropping duplicate members. A union of one type is just that type,
/// and an empty union is `never`.
pub fn union(types: impl IntoIterator<Item = Box<TsType>>) -> Box<TsType> {
    let mut members: Vec<Box<TsType>> = vec![];
    for ty in types {
        let flattened = match *ty {
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(inner)) => {
                inner.types
            }
            ty => vec![Box::new(ty)],
        };
        for ty in flattened {
            if !members.contains(&ty) {
                members.push(ty);
            }
        }
    }
    match members.len() {
        0 => kw(TsKeywordTypeKind::TsNeverKeyword),
        1 => members.remove(0),
        _ => Box::new(TsType::TsUnionOrIntersectionType(
            TsUnionOrIntersectionType::TsUnionType(TsUnionType {
                span: DUMMY_SP,
                types: members,
            }),
        )),
    }
}

/// Creates an intersection type `A & B & C`. An intersection of one type
/// is just that type.
#[allow(clippy::vec_box)] // `TsIntersectionType` requires `Vec<Box<TsType>>`.
pub fn intersection(mut types: Vec<Box<TsType>>) -> Box<TsType> {
    match types.len() {
        0 => kw(TsKeywordTypeKind::TsUnknownKeyword),
        1 => types.remove(0),
        _ => Box::new(TsType::TsUnionOrIntersectionType(
            TsUnionOrIntersectionType::TsIntersectionType(TsIntersectionType {
                span: DUMMY_SP,
                types,
            }),
        )),
    }
}

/// Creates a reference to a named type.
pub fn type_ref(name: &str) -> Box<TsType> {
    Box::new(TsType::TsTypeRef(TsTypeRef {
        span: DUMMY_SP,
        type_name: TsEntityName::Ident(ident(name)),
        type_params: None,
    }))
}

/// Creates an anonymous object type `{ field: Type; ... }`.
pub fn type_lit(members: Vec<TsTypeElement>) -> Box<TsType> {
    Box::new(TsType::TsTypeLit(TsTypeLit {
        span: DUMMY_SP,
        members,
    }))
}

/// Wraps a type in a nullable union (`T | null`).
pub fn nullable(ty: Box<TsType>) -> Box<TsType> {
    union([ty, kw(TsKeywordTypeKind::TsNullKeyword)])
}

// MARK: Members

/// Creates a property signature for an interface or type literal.
/// Names that aren't identifiers are quoted.
pub fn property_sig(name: &str, optional: bool, ty: Box<TsType>, span: Span) -> TsTypeElement {
    let key = if is_ts_ident(name) {
        Expr::Ident(ident(name))
    } else {
        Expr::Lit(Lit::Str(str_lit(name)))
    };
    TsTypeElement::TsPropertySignature(TsPropertySignature {
        span,
        readonly: false,
        key: Box::new(key),
        computed: false,
        optional,
        type_ann: Some(Box::new(TsTypeAnn {
            span: DUMMY_SP,
            type_ann: ty,
        })),
    })
}

// MARK: Declarations

/// Creates an `interface Name { members }` declaration.
pub fn interface_decl(name: &str, members: Vec<TsTypeElement>) -> Decl {
    Decl::TsInterface(Box::new(TsInterfaceDecl {
        span: DUMMY_SP,
        id: ident(name),
        declare: false,
        type_params: None,
        extends: vec![],
        body: TsInterfaceBody {
            span: DUMMY_SP,
            body: members,
        },
    }))
}

/// Creates a `type Name = Type` declaration.
pub fn type_alias_decl(name: &str, ty: Box<TsType>) -> Decl {
    Decl::TsTypeAlias(Box::new(TsTypeAliasDecl {
        span: DUMMY_SP,
        declare: false,
        id: ident(name),
        type_params: None,
        type_ann: ty,
    }))
}

// MARK: Module items

/// Wraps a declaration in `export <decl>` with the given span, which
/// carries the declaration's JSDoc comment.
pub fn export_decl(decl: Decl, span: Span) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl { span, decl }))
}

/// Creates `import * as name from "module";`.
pub fn import_namespace_decl(name: &str, module: &str) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
        span: DUMMY_SP,
        specifiers: vec![ImportSpecifier::Namespace(ImportStarAsSpecifier {
            span: DUMMY_SP,
            local: ident(name),
        })],
        src: Box::new(str_lit(module)),
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }))
}

/// Creates `export { names };`.
pub fn export_names(names: &[String]) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(NamedExport {
        span: DUMMY_SP,
        specifiers: names
            .iter()
            .map(|name| {
                ExportSpecifier::Named(ExportNamedSpecifier {
                    span: DUMMY_SP,
                    orig: ModuleExportName::Ident(ident(name)),
                    exported: None,
                    is_type_only: false,
                })
            })
            .collect(),
        src: None,
        type_only: false,
        with: None,
    }))
}

// MARK: Emitter

/// Emits a list of module items as a formatted TypeScript string.
pub fn emit_module(body: Vec<ModuleItem>, comments: &TsComments) -> std::io::Result<String> {
    let cm: Lrc<SourceMap> = Lrc::new(SourceMap::default());
    let mut buf = Vec::new();

    let module = Module {
        span: DUMMY_SP,
        body,
        shebang: None,
    };

    {
        let mut wr = JsWriter::new(cm.clone(), "\n", &mut buf, None);
        wr.set_indent_str("  ");
        let mut emitter = Emitter {
            cfg: Default::default(),
            cm: cm.clone(),
            comments: Some(&comments.comments),
            wr,
        };
        emitter.emit_module(&module)?;
    }

    let mut result = String::from_utf8(buf)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    if !result.ends_with('\n') {
        result.push('\n');
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use swc_ecma_ast::TsKeywordTypeKind::*;

    /// Emits a single exported type alias and returns the output string.
    fn emit_export_type(name: &str, ty: Box<TsType>) -> String {
        let comments = TsComments::new();
        let items = vec![export_decl(type_alias_decl(name, ty), DUMMY_SP)];
        emit_module(items, &comments).unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            emit_export_type("T", lit_str("active")),
            "export type T = \"active\";\n"
        );
        assert_eq!(
            emit_export_type("T", lit_num(&serde_json::Number::from(42))),
            "export type T = 42;\n"
        );
        assert_eq!(
            emit_export_type("T", lit_bool(false)),
            "export type T = false;\n"
        );
    }

    #[test]
    fn test_array_of_union_adds_parens() {
        let ty = array(union([kw(TsStringKeyword), kw(TsNumberKeyword)]));
        assert_eq!(
            emit_export_type("T", ty),
            "export type T = (string | number)[];\n"
        );
    }

    #[test]
    fn test_record() {
        assert_eq!(
            emit_export_type("T", record(kw(TsUnknownKeyword))),
            "export type T = Record<string, unknown>;\n"
        );
    }

    #[test]
    fn test_union_flattens_and_dedups() {
        let ty = union([
            union([kw(TsStringKeyword), kw(TsNullKeyword)]),
            kw(TsNullKeyword),
            type_ref("Pet"),
        ]);
        assert_eq!(
            emit_export_type("T", ty),
            "export type T = string | null | Pet;\n"
        );
    }

    #[test]
    fn test_union_of_one_is_that_type() {
        assert_eq!(
            emit_export_type("T", union([kw(TsBooleanKeyword), kw(TsBooleanKeyword)])),
            "export type T = boolean;\n"
        );
        assert_eq!(emit_export_type("T", union([])), "export type T = never;\n");
    }

    #[test]
    fn test_intersection() {
        let ty = intersection(vec![type_ref("Foo"), type_ref("Bar")]);
        assert_eq!(emit_export_type("T", ty), "export type T = Foo & Bar;\n");
        assert_eq!(
            emit_export_type("T", intersection(vec![type_ref("Foo")])),
            "export type T = Foo;\n"
        );
    }

    #[test]
    fn test_nullable_union_stays_flat() {
        let ty = nullable(union([lit_str("a"), lit_str("b")]));
        assert_eq!(
            emit_export_type("T", ty),
            "export type T = \"a\" | \"b\" | null;\n"
        );
    }

    #[test]
    fn test_interface_with_quoted_property() {
        let comments = TsComments::new();
        let decl = interface_decl(
            "Headers",
            vec![
                property_sig("x-request-id", false, kw(TsStringKeyword), DUMMY_SP),
                property_sig("retries", true, kw(TsNumberKeyword), DUMMY_SP),
            ],
        );
        assert_eq!(
            emit_module(vec![export_decl(decl, DUMMY_SP)], &comments).unwrap(),
            indoc::indoc! {r#"
                export interface Headers {
                  "x-request-id": string;
                  retries?: number;
                }
            "#}
        );
    }

    #[test]
    fn test_module_with_description() {
        let comments = TsComments::new();
        let span = comments.span_with_jsdoc(Some("The status of a resource."));
        let items = vec![
            export_decl(type_alias_decl("Status", kw(TsStringKeyword)), span),
            export_decl(type_alias_decl("Id", kw(TsNumberKeyword)), DUMMY_SP),
        ];
        assert_eq!(
            emit_module(items, &comments).unwrap(),
            indoc::indoc! {"
                /** The status of a resource. */ export type Status = string;
                export type Id = number;
            "}
        );
    }

    #[test]
    fn test_description_cannot_close_comment() {
        let comments = TsComments::new();
        let span = comments.span_with_jsdoc(Some("Matches `*/*`."));
        let items = vec![export_decl(
            type_alias_decl("Accept", kw(TsStringKeyword)),
            span,
        )];
        assert_eq!(
            emit_module(items, &comments).unwrap(),
            "/** Matches `*\\/*`. */ export type Accept = string;\n"
        );
    }

    #[test]
    fn test_namespace_import_and_named_export() {
        let comments = TsComments::new();
        let items = vec![
            import_namespace_decl("pet_store", "./pet_store.d.ts"),
            export_names(&["pet_store".to_owned()]),
        ];
        assert_eq!(
            emit_module(items, &comments).unwrap(),
            indoc::indoc! {r#"
                import * as pet_store from "./pet_store.d.ts";
                export { pet_store };
            "#}
        );
    }
}
