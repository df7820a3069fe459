// End-to-end inlining tests over the public API: parse the root source,
// resolve imports against in-memory fragments, merge patches, and check
// the assembled tree and its printed form.

use tangle::application::InlineUsecase;
use tangle::domain::ast::{Expr, StmtKind};
use tangle::domain::TangleError;
use tangle::infrastructure::fragment_loader::CountingLoader;
use tangle::infrastructure::{DefaultParser, MemoryFragmentLoader, PrettyUnparser};
use tangle::ports::{SourceParser, SourceUnparser};

fn assemble(root: &str, fragments: &[(&str, &str)]) -> tangle::domain::ast::Module {
    let mut loader = MemoryFragmentLoader::new();
    for (name, text) in fragments {
        loader.insert(name, text);
    }
    let parser = DefaultParser;
    let tree = parser.parse(root, "main").unwrap();
    let usecase = InlineUsecase { loader: &loader, parser: &parser };
    usecase.run(&tree).unwrap()
}

#[test]
fn greeter_end_to_end() {
    let base = concat!(
        "class Greeter:\n",
        "    def hello(self):\n",
        "        return \"hi\"\n",
    );
    let main = concat!(
        "from base import Greeter\n",
        "\n",
        "@tangle.patch(Greeter)\n",
        "class Greeter:\n",
        "    def hello(self):\n",
        "        return \"hello\"\n",
    );

    let assembled = assemble(main, &[("base", base)]);

    // One class, no import, no patch marker left.
    assert_eq!(assembled.body.len(), 1);
    let class = match &assembled.body[0].kind {
        StmtKind::ClassDef(class) => class,
        other => panic!("expected class, got {:?}", other),
    };
    assert_eq!(class.name, "Greeter");
    assert!(class.decorators.is_empty());

    // hello is the patched version.
    let rendered = PrettyUnparser.unparse(&assembled).unwrap();
    assert!(rendered.contains("return \"hello\""));
    assert!(!rendered.contains("return \"hi\""));
    assert!(!rendered.contains("import"));
}

#[test]
fn inline_is_idempotent() {
    let base = "class Greeter:\n    def hello(self):\n        return \"hi\"\n";
    let main = concat!(
        "from base import Greeter\n",
        "@tangle.patch(Greeter)\n",
        "class Greeter:\n",
        "    def hello(self):\n",
        "        return \"hello\"\n",
    );

    let mut loader = MemoryFragmentLoader::new();
    loader.insert("base", base);
    let parser = DefaultParser;
    let tree = parser.parse(main, "main").unwrap();
    let usecase = InlineUsecase { loader: &loader, parser: &parser };

    let once = usecase.run(&tree).unwrap();
    let twice = usecase.run(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn caller_tree_is_not_mutated() {
    let main = "from base import x\n";
    let mut loader = MemoryFragmentLoader::new();
    loader.insert("base", "x = 1\n");
    let parser = DefaultParser;
    let tree = parser.parse(main, "main").unwrap();
    let before = tree.clone();

    let usecase = InlineUsecase { loader: &loader, parser: &parser };
    usecase.run(&tree).unwrap();
    assert_eq!(tree, before);
}

#[test]
fn patch_position_is_independent_of_declaration_order() {
    let patch_after = concat!(
        "class C:\n",
        "    def a(self):\n",
        "        return 1\n",
        "@patch(C)\n",
        "class C:\n",
        "    def b(self):\n",
        "        return 2\n",
    );
    let patch_before = concat!(
        "@patch(C)\n",
        "class C:\n",
        "    def b(self):\n",
        "        return 2\n",
        "class C:\n",
        "    def a(self):\n",
        "        return 1\n",
    );

    let a = assemble(patch_after, &[]);
    let b = assemble(patch_before, &[]);
    assert_eq!(a, b);

    let rendered = PrettyUnparser.unparse(&a).unwrap();
    let a_pos = rendered.find("def a").unwrap();
    let b_pos = rendered.find("def b").unwrap();
    assert!(a_pos < b_pos, "own members come before patch-only members");
}

#[test]
fn override_lands_in_place_and_new_members_append() {
    let main = concat!(
        "class C:\n",
        "    def a(self):\n",
        "        return 1\n",
        "    def b(self):\n",
        "        return 2\n",
        "@patch(C)\n",
        "class C:\n",
        "    def b(self):\n",
        "        return 20\n",
        "    def c(self):\n",
        "        return 3\n",
    );
    let assembled = assemble(main, &[]);
    let class = match &assembled.body[0].kind {
        StmtKind::ClassDef(class) => class,
        other => panic!("expected class, got {:?}", other),
    };
    let names: Vec<&str> = class
        .body
        .iter()
        .map(|s| match &s.kind {
            StmtKind::FunctionDef(f) => f.name.as_str(),
            other => panic!("unexpected member {:?}", other),
        })
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let rendered = PrettyUnparser.unparse(&assembled).unwrap();
    assert!(rendered.contains("return 20"));
    assert!(!rendered.contains("return 2\n    def c"));
}

#[test]
fn tuple_unpack_members_are_independently_importable() {
    let main = "from geometry import HEIGHT\n";
    let assembled = assemble(main, &[("geometry", "WIDTH, HEIGHT = 800, 600\n")]);
    assert_eq!(assembled.body.len(), 1);
    assert_eq!(
        assembled.body[0].kind,
        StmtKind::Assign {
            targets: vec![Expr::name("HEIGHT")],
            value: Expr::int(600),
        }
    );
}

#[test]
fn missing_symbol_is_an_unresolvable_reference() {
    let mut loader = MemoryFragmentLoader::new();
    loader.insert("base", "x = 1\n");
    let parser = DefaultParser;
    let tree = parser.parse("from base import ghost\n", "main").unwrap();
    let usecase = InlineUsecase { loader: &loader, parser: &parser };

    match usecase.run(&tree) {
        Err(TangleError::NoDefinition { name, fragment }) => {
            assert_eq!(name, "ghost");
            assert_eq!(fragment, "base");
        }
        other => panic!("expected NoDefinition, got {:?}", other),
    }
}

#[test]
fn duplicate_symbol_names_both_candidates() {
    let mut loader = MemoryFragmentLoader::new();
    loader.insert("base", "def f():\n    return 1\ndef f():\n    return 2\n");
    let parser = DefaultParser;
    let tree = parser.parse("from base import f\n", "main").unwrap();
    let usecase = InlineUsecase { loader: &loader, parser: &parser };

    match usecase.run(&tree) {
        Err(TangleError::MultipleDefinitions { name, candidates, .. }) => {
            assert_eq!(name, "f");
            assert_eq!(candidates.lines().count(), 2);
        }
        other => panic!("expected MultipleDefinitions, got {:?}", other),
    }
}

#[test]
fn wildcard_import_is_rejected() {
    let loader = MemoryFragmentLoader::new();
    let parser = DefaultParser;
    let tree = parser.parse("from base import *\n", "main").unwrap();
    let usecase = InlineUsecase { loader: &loader, parser: &parser };
    assert!(matches!(
        usecase.run(&tree),
        Err(TangleError::UnsupportedImport { .. })
    ));
}

#[test]
fn shared_fragment_is_loaded_once() {
    let mut inner = MemoryFragmentLoader::new();
    inner.insert("shared", "VALUE = 1\n");
    inner.insert("a", "from shared import VALUE\nx = VALUE\n");
    inner.insert("b", "from shared import VALUE\ny = VALUE\n");
    let loader = CountingLoader::new(&inner);
    let parser = DefaultParser;

    let main = "from a import x\nfrom b import y\nfrom shared import VALUE\n";
    let tree = parser.parse(main, "main").unwrap();
    let usecase = InlineUsecase { loader: &loader, parser: &parser };
    usecase.run(&tree).unwrap();

    assert_eq!(loader.count("shared"), 1);
    assert_eq!(loader.count("a"), 1);
    assert_eq!(loader.count("b"), 1);
}

#[test]
fn main_guard_and_registry_noise_survive_in_the_root_only() {
    // The root tree keeps its own guard; the imported fragment's guard and
    // plain imports are never spliced in.
    let fragment = concat!(
        "import sys\n",
        "class Tool:\n",
        "    pass\n",
        "if __name__ == \"__main__\":\n",
        "    pass\n",
    );
    let main = concat!(
        "from toolbox import Tool\n",
        "if __name__ == \"__main__\":\n",
        "    pass\n",
    );
    let assembled = assemble(main, &[("toolbox", fragment)]);
    assert_eq!(assembled.body.len(), 2);
    assert!(matches!(
        &assembled.body[0].kind,
        StmtKind::ClassDef(class) if class.name == "Tool"
    ));
    assert!(matches!(&assembled.body[1].kind, StmtKind::If { .. }));
}
