//! Integration tests for import-graph traversal and copying.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use forja_core::imports::{AliasResolver, DependencyCopier, VisitedSet, DEFAULT_ALIAS};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Every file under `dir`, relative to it.
fn file_set(dir: &Path) -> BTreeSet<PathBuf> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeSet<PathBuf>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                out.insert(path.strip_prefix(base).unwrap().to_path_buf());
            }
        }
    }
    let mut out = BTreeSet::new();
    if dir.exists() {
        walk(dir, dir, &mut out);
    }
    out
}

/// Hero → {Button, utils}, Button → utils (diamond), plus an unrelated file.
fn acyclic_fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(
        &src,
        "components/sections/Hero.tsx",
        r#"import React from "react";
import { Button } from "@/components/ui/Button";
import { cn } from "@/lib/utils";

export default function Hero({ content }: { content: { title: string } }) {
  return <section className={cn("hero")}><h1>{content.title}</h1><Button>Don't wait</Button></section>;
}
"#,
    );
    write(
        &src,
        "components/ui/Button.tsx",
        "import { cn } from '@/lib/utils';\nexport const Button = (p: any) => <button className={cn('b')} {...p} />;\n",
    );
    write(
        &src,
        "lib/utils.ts",
        "export const cn = (...c: string[]) => c.join(' ');\n",
    );
    write(&src, "lib/unused.ts", "export const nope = 1;\n");
    tmp
}

fn copier(tmp: &TempDir) -> DependencyCopier {
    DependencyCopier::new(AliasResolver::new(tmp.path().join("src"), DEFAULT_ALIAS))
}

#[tokio::test]
async fn copies_transitive_closure_only() {
    let tmp = acyclic_fixture();
    let dest = tmp.path().join("out");
    let copier = copier(&tmp);
    let mut visited = VisitedSet::new();

    let report = copier
        .traverse(
            &tmp.path().join("src/components/sections/Hero.tsx"),
            &dest,
            &mut visited,
        )
        .await
        .unwrap();

    let expected: BTreeSet<PathBuf> = [
        "components/sections/Hero.tsx",
        "components/ui/Button.tsx",
        "lib/utils.ts",
    ]
    .iter()
    .map(PathBuf::from)
    .collect();
    assert_eq!(file_set(&dest), expected);
    assert_eq!(report.copied.len(), 3);
    assert_eq!(report.copied[0], PathBuf::from("components/sections/Hero.tsx"));
    assert_eq!(report.warning_count(), 0);
}

#[tokio::test]
async fn copies_are_byte_identical() {
    let tmp = acyclic_fixture();
    let dest = tmp.path().join("out");
    let mut visited = VisitedSet::new();
    copier(&tmp)
        .traverse(
            &tmp.path().join("src/components/sections/Hero.tsx"),
            &dest,
            &mut visited,
        )
        .await
        .unwrap();
    assert_eq!(
        fs::read(tmp.path().join("src/components/ui/Button.tsx")).unwrap(),
        fs::read(dest.join("components/ui/Button.tsx")).unwrap()
    );
}

#[tokio::test]
async fn second_traversal_visits_nothing_new() {
    let tmp = acyclic_fixture();
    let dest = tmp.path().join("out");
    let copier = copier(&tmp);
    let entry = tmp.path().join("src/components/sections/Hero.tsx");
    let mut visited = VisitedSet::new();

    copier.traverse(&entry, &dest, &mut visited).await.unwrap();
    let first = file_set(&dest);
    let again = copier.traverse(&entry, &dest, &mut visited).await.unwrap();

    assert!(again.copied.is_empty());
    assert_eq!(file_set(&dest), first);
}

#[tokio::test]
async fn fresh_traversal_yields_identical_file_set() {
    let tmp = acyclic_fixture();
    let dest = tmp.path().join("out");
    let copier = copier(&tmp);
    let entry = tmp.path().join("src/components/sections/Hero.tsx");

    copier
        .traverse(&entry, &dest, &mut VisitedSet::new())
        .await
        .unwrap();
    let first = file_set(&dest);
    copier
        .traverse(&entry, &dest, &mut VisitedSet::new())
        .await
        .unwrap();
    assert_eq!(file_set(&dest), first);
}

#[tokio::test]
async fn cycles_terminate_and_are_idempotent() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(&src, "a.ts", "import { b } from '@/b';\nexport const a = 1;\n");
    write(&src, "b.ts", "import { c } from '@/c';\nexport const b = 2;\n");
    write(&src, "c.ts", "import { a } from '@/a';\nexport const c = 3;\n");
    let dest = tmp.path().join("out");
    let copier = copier(&tmp);
    let mut visited = VisitedSet::new();

    let report = copier
        .traverse(&src.join("a.ts"), &dest, &mut visited)
        .await
        .unwrap();
    assert_eq!(report.copied.len(), 3);
    assert_eq!(visited.len(), 3);

    let again = copier
        .traverse(&src.join("b.ts"), &dest, &mut visited)
        .await
        .unwrap();
    assert!(again.copied.is_empty());
    assert_eq!(file_set(&dest).len(), 3);
}

#[tokio::test]
async fn unresolved_import_is_a_warning() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(
        &src,
        "components/sections/Promo.tsx",
        "import { gone } from '@/lib/gone';\nimport { ok } from '@/lib/ok';\nexport default () => null;\n",
    );
    write(&src, "lib/ok.ts", "export const ok = true;\n");
    let dest = tmp.path().join("out");

    let report = copier(&tmp)
        .traverse(
            &src.join("components/sections/Promo.tsx"),
            &dest,
            &mut VisitedSet::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].specifier, "@/lib/gone");
    assert!(dest.join("lib/ok.ts").exists());
}

#[tokio::test]
async fn generic_arrow_component_keeps_its_dependencies() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(
        &src,
        "components/sections/Hero.tsx",
        "import { a } from '@/lib/a';\n\
         export const pick = <T,>(x: T) => x;\n\
         export const keep = <T extends unknown>(x: T) => x;\n\
         export default function Hero() { return <h1>{pick(a)}</h1>; }\n",
    );
    write(&src, "lib/a.ts", "export const a = 'x';\n");
    let dest = tmp.path().join("out");

    let report = copier(&tmp)
        .traverse(
            &src.join("components/sections/Hero.tsx"),
            &dest,
            &mut VisitedSet::new(),
        )
        .await
        .unwrap();

    assert!(report.parse_failures.is_empty(), "{:?}", report.parse_failures);
    assert!(dest.join("lib/a.ts").exists());
}

#[tokio::test]
async fn unparsable_file_is_copied_without_its_dependencies() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(
        &src,
        "broken.ts",
        "import { dep } from '@/dep';\nconst s = 'never closed;\n",
    );
    write(&src, "dep.ts", "export const dep = 1;\n");
    let dest = tmp.path().join("out");

    let report = copier(&tmp)
        .traverse(&src.join("broken.ts"), &dest, &mut VisitedSet::new())
        .await
        .unwrap();

    assert_eq!(report.parse_failures.len(), 1);
    assert!(report.parse_failures[0].error.line >= 1);
    assert!(dest.join("broken.ts").exists());
    assert!(!dest.join("dep.ts").exists());
}

#[tokio::test]
async fn non_script_dependencies_are_copied_not_scanned() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    write(&src, "a.ts", "import '@/styles/a.css';\n");
    write(&src, "styles/a.css", ".a { content: 'import x from \"@/b\"'; }\n");
    let dest = tmp.path().join("out");

    let report = copier(&tmp)
        .traverse(&src.join("a.ts"), &dest, &mut VisitedSet::new())
        .await
        .unwrap();
    assert_eq!(report.copied.len(), 2);
    assert_eq!(report.warning_count(), 0);
}

#[tokio::test]
async fn missing_entry_is_fatal() {
    let tmp = acyclic_fixture();
    let result = copier(&tmp)
        .traverse(
            &tmp.path().join("src/nope.ts"),
            &tmp.path().join("out"),
            &mut VisitedSet::new(),
        )
        .await;
    assert!(result.is_err());
}
