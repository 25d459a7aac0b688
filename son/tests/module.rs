use son::tree::build::*;
use son::{JsPrinter, JsonTreeParser, MemoryFs, Node, OutputFormat, Son};
use std::path::{Path, PathBuf};

fn header(name: &str, args: Vec<Node>) -> Node {
    stmt(call_named(name, args))
}

fn json(body: Vec<Node>) -> String {
    serde_json::to_string(&body).unwrap()
}

fn run(fs: &MemoryFs, input: &str) -> son::Result<Vec<PathBuf>> {
    let parser = JsonTreeParser::new();
    let printer = JsPrinter::new();
    Son::new(fs, &parser, &printer)
        .format(OutputFormat::Browser)
        .run(Path::new(input), Path::new("out"))
}

fn shapes() -> MemoryFs {
    MemoryFs::new()
        .with_file(
            "shapes/shapes.son",
            &json(vec![header("module", vec![object(vec![("format", text("commonjs"))])])]),
        )
        .with_file(
            "shapes/side.json",
            &json(vec![header("prop", vec![]), ret(Some(awaited(call_named("load", vec![]))))]),
        )
        .with_file(
            "shapes/area.json",
            &json(vec![
                header("prop", vec![]),
                ret(Some(binary("*", ident("side"), ident("side")))),
            ]),
        )
        .with_file(
            "shapes/describe.json",
            &json(vec![
                header("fun", vec![]),
                stmt(call_named("compute", vec![ident("area")])),
                ret(Some(ident("area"))),
            ]),
        )
        .with_file("shapes/README.md", "not a source file")
}

#[test]
fn module_with_async_property() {
    let fs = shapes();
    let written = run(&fs, "shapes/shapes.son").unwrap();
    assert_eq!(written, vec![PathBuf::from("out/shapes.js")]);
    let text = fs.get("out/shapes.js").unwrap();
    println!("{}", text);
    assert_eq!(
        text,
        r#"var area, side;

async function describe() {
    await __compute_all_area();
    return area;
}

async function __compute_all_area() {
    side = await __compute_side();
    area = __compute_area();
    return area;
}

function __compute_area() {
    return side * side;
}

async function __compute_side() {
    return await load();
}

module.exports = {
    describe: describe
};
"#
    );
}

#[test]
fn directory_mode() {
    let fs = shapes().with_file(
        "tools/double.json",
        &json(vec![
            header("fun", vec![ident("x")]),
            ret(Some(binary("*", ident("x"), num(2.0)))),
        ]),
    );
    let written = run(&fs, "").unwrap();
    // tools has no module file and no subfolders
    assert_eq!(written, vec![PathBuf::from("out/shapes/shapes.js")]);
}

#[test]
fn single_function_file() {
    let fs = MemoryFs::new().with_file(
        "double.json",
        &json(vec![
            header("fun", vec![ident("x")]),
            ret(Some(binary("*", ident("x"), num(2.0)))),
        ]),
    );
    run(&fs, "double.json").unwrap();
    assert_eq!(
        fs.get("out/double.js").unwrap(),
        "function double(x) {\n    return x * 2;\n}\n"
    );
}

#[test]
fn property_file_alone() {
    let fs = MemoryFs::new().with_file("area.json", &json(vec![header("prop", vec![]), ret(Some(num(1.0)))]));
    let err = run(&fs, "area.json").unwrap_err();
    assert_eq!(err.code(), "SON0003");
}

#[test]
fn property_cycle() {
    let fs = MemoryFs::new()
        .with_file("m/m.son", &json(vec![header("module", vec![])]))
        .with_file("m/a.json", &json(vec![header("prop", vec![]), ret(Some(ident("b")))]))
        .with_file("m/b.json", &json(vec![header("prop", vec![]), ret(Some(ident("a")))]));
    let err = run(&fs, "m/m.son").unwrap_err();
    assert_eq!(
        err.to_string(),
        "SON0031: Detected a cycle in property dependencies: a > b > a. File m/b.json"
    );
}

#[test]
fn nested_module() {
    let fs = MemoryFs::new()
        .with_file("m/m.son", &json(vec![header("module", vec![])]))
        .with_file("m/inner/n.son", &json(vec![header("module", vec![])]));
    let err = run(&fs, "m/m.son").unwrap_err();
    assert_eq!(err.code(), "SON0026");
}

#[test]
fn several_modules() {
    let fs = MemoryFs::new()
        .with_file("m/m.son", &json(vec![header("module", vec![])]))
        .with_file("m/n.son", &json(vec![header("module", vec![])]));
    let err = run(&fs, "m").unwrap_err();
    assert_eq!(err.code(), "SON0027");
}

#[test]
fn assignment_to_property() {
    let fs = MemoryFs::new()
        .with_file("m/m.son", &json(vec![header("module", vec![])]))
        .with_file("m/a.json", &json(vec![header("prop", vec![]), ret(Some(num(1.0)))]))
        .with_file(
            "m/f.json",
            &json(vec![header("fun", vec![]), stmt(assign(ident("a"), num(2.0)))]),
        );
    let err = run(&fs, "m/m.son").unwrap_err();
    assert_eq!(err.code(), "SON0019");
    assert_eq!(err.file, Some(PathBuf::from("m/f.json")));
}

#[test]
fn compute_of_function() {
    let fs = MemoryFs::new()
        .with_file("m/m.son", &json(vec![header("module", vec![])]))
        .with_file("m/g.json", &json(vec![header("fun", vec![]), ret(None)]))
        .with_file(
            "m/f.json",
            &json(vec![header("fun", vec![]), stmt(call_named("compute", vec![ident("g")]))]),
        );
    let err = run(&fs, "m/m.son").unwrap_err();
    assert_eq!(err.code(), "SON0020");
}

#[test]
fn parse_error() {
    let fs = MemoryFs::new().with_file("broken.json", "[{\"type\": ");
    let err = run(&fs, "broken.json").unwrap_err();
    assert_eq!(err.code(), "SON0002");
    assert_eq!(err.file, Some(PathBuf::from("broken.json")));
}
