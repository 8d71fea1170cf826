use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use pretty_assertions::assert_eq;
use r2lang::{
    get_result,
    interpreter::runtime::core::{Output, Runtime},
    run_file, run_source,
};
use walkdir::WalkDir;

fn assert_success(src: &str) {
    if let Err(e) = get_result(src) {
        panic!("Script failed: {e}\n{src}");
    }
}

fn assert_failure(src: &str) {
    if get_result(src).is_ok() {
        panic!("Script succeeded but was expected to fail:\n{src}")
    }
}

fn error_of(src: &str) -> String {
    match get_result(src) {
        Ok(()) => panic!("Script succeeded but was expected to fail:\n{src}"),
        Err(e) => e.to_string(),
    }
}

fn output_of(src: &str) -> String {
    let output = Output::buffer();
    let runtime = Arc::new(Runtime::with_output(output.clone()));
    if let Err(e) = run_source(src, runtime, None) {
        panic!("Script failed: {e}\n{src}");
    }
    output.contents()
}

/// A scratch directory for scripts that import each other.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("r2lang-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn fixture_scripts_run() {
    let mut count = 0;

    for entry in
        WalkDir::new("tests/scripts").into_iter()
                                     .filter_map(Result::ok)
                                     .filter(|e| e.path().extension().is_some_and(|ext| ext == "r2"))
    {
        count += 1;
        let path = entry.path();
        if let Err(e) = run_file(path) {
            panic!("Script {} failed: {e}", path.display());
        }
    }

    assert!(count > 0, "No scripts found in tests/scripts");
}

#[test]
fn declarations_and_arithmetic() {
    assert_success("let x = 1 + 2; assert(x == 3);");
    assert_success("var a = 1, b, c = a + 1; assert(b == nil); assert(c == 2);");
    assert_success("let x = 7 % 3; assert(x == 1); assert(2 + 3 * 4 == 14);");
    assert_success("assert((2 + 3) * 4 == 20); assert(-2 * 3 == -6);");
    assert_success("assert(10 / 4 == 2.5); assert(\"3\" * 2 == 6);");
}

#[test]
fn compound_assignments_and_increments() {
    assert_success("let x = 2; x += 3; assert(x == 5);");
    assert_success("let x = 7; x -= 2; assert(x == 5);");
    assert_success("let x = 4; x *= 2; assert(x == 8);");
    assert_success("let x = 9; x /= 3; assert(x == 3);");
    assert_success("let x = 1; x++; x++; x--; assert(x == 2);");
}

#[test]
fn logical_and_comparisons() {
    assert_success("assert(2 < 3); assert(3 > 2); assert(2 <= 2); assert(3 >= 3);");
    assert_success("assert(2 != 3); assert(!false); assert(\"a\" < \"b\");");
    assert_success("assert((nil || \"x\") == \"x\"); assert((0 && 1) == 0);");
    assert_success("assert((nil ?? 5) == 5); assert((0 ?? 5) == 0);");
    assert_success("assert((6 & 3) == 2); assert((1 << 4) == 16); assert(~0 == -1);");
    assert_success("let x = 5; assert((x > 3 ? \"big\" : \"small\") == \"big\");");
}

#[test]
fn control_flow() {
    let out = output_of("let s = []; for (let i = 0; i < 5; i++) { s.push(i); } print(s);");
    assert_eq!(out, "[0, 1, 2, 3, 4]\n");

    let out = output_of("let i = 0; let total = 0; \
                         while (true) { i++; if (i > 10) { break; } \
                         if (i % 2 == 0) { continue; } total += i; } print(total);");
    assert_eq!(out, "25\n");

    let out = output_of("let x = 15; \
                         if (x < 10) { print(\"small\"); } \
                         else if (x < 20) { print(\"medium\"); } \
                         else { print(\"large\"); }");
    assert_eq!(out, "medium\n");
}

#[test]
fn for_in_over_collections() {
    let out = output_of("for (i in [\"a\", \"b\"]) { print(i, $v); } \
                         for (k in {x: 1}) { print(k, $v); } \
                         let n = 0; for (c in \"abc\") { n += 1; } print(n);");
    assert_eq!(out, "0 a\n1 b\nx 1\n3\n");
}

#[test]
fn functions_and_closures() {
    let out = output_of("func makeCounter() { let n = 0; return func() { n = n + 1; return n; }; } \
                         let a = makeCounter(); let b = makeCounter(); \
                         a(); a(); print(a(), b());");
    assert_eq!(out, "3 1\n");

    assert_success("func fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); } \
                    assert(fact(10) == 3628800);");
    assert_success("let add = (a, b) => a + b; assert(add(2, 5) == 7);");
    assert_success("func greet(name, greeting = \"hi\") { return greeting + \" \" + name; } \
                    assert(greet(\"bob\") == \"hi bob\"); \
                    assert(greet(\"bob\", \"yo\", 99) == \"yo bob\");");
}

#[test]
fn undeclared_assignment_defines_a_global() {
    assert_eq!(output_of("func f() { y = 5; } f(); print(y);"), "5\n");
    assert_eq!(output_of("if (true) { let t = 1; z = t + 1; } print(z);"), "2\n");
    assert_eq!(output_of("let n = 1; func bump() { n = n + 1; } bump(); print(n);"), "2\n");
}

#[test]
fn return_unwinds_nested_blocks() {
    let out = output_of("func find(xs, target) { \
                           for (i in xs) { if (xs[i] == target) { return i; } } \
                           return -1; } \
                         print(find([4, 5, 6], 6), find([1], 9));");
    assert_eq!(out, "2 -1\n");
}

#[test]
fn strings_and_templates() {
    let out = output_of("let name = \"R2\"; print(`hello ${name}, ${1 + 2}`); \
                         print(\"a\" + 1, \"tab\\tend\", 'single');");
    assert_eq!(out, "hello R2, 3\na1 tab\tend single\n");
}

#[test]
fn arrays_and_maps() {
    assert_success("let a = [1, 2, 3]; a[5] = 6; assert(len(a) == 6); assert(a[4] == nil);");
    assert_success("let a = [1, 2, 3]; assert(a[-1] == 3); a[-1] = 9; assert(a[2] == 9);");
    assert_success("let m = {a: 1, \"b c\": 2}; m.d = 4; m[\"e\"] = 5; \
                    assert(m.a + m[\"b c\"] + m.d + m.e == 12); assert(m[\"zzz\"] == nil);");
    assert_success("let a = [1, [2]]; let b = deepCopy(a); b[1].push(3); assert(len(a[1]) == 1);");
    assert_success("let a = [1]; let b = a + 2; assert(len(a) == 1); assert(len(b) == 2);");
}

#[test]
fn classes_and_inheritance() {
    assert_success("class Point { let x; let y; func dist() { return sqrt(x * x + y * y); } } \
                    let p = Point(3, 4); assert(p.dist() == 5); \
                    let q = new Point(6, 8); assert(q.dist() == 10);");

    let out = output_of("class Animal { let name; \
                           constructor(name) { self.name = name; } \
                           func speak() { return self.name + \" makes a sound\"; } } \
                         class Dog extends Animal { \
                           func speak() { return super.speak() + \" (woof)\"; } } \
                         let d = new Dog(\"Rex\"); print(d.speak(), typeOf(d), d.name);");
    assert_eq!(out, "Rex makes a sound (woof) object Rex\n");

    assert_success("obj Counter { let n = 0; inc() { this.n = this.n + 1; return this; } } \
                    let c = Counter(); c.inc().inc(); assert(c.n == 2);");
}

#[test]
fn exceptions() {
    let out = output_of("try { 1 / 0; } catch (e) { print(\"caught: \" + e); }");
    assert_eq!(out, "caught: Error on line 1: Division by zero.\n");

    let out = output_of("func risky() { throw {code: 7}; } \
                         try { risky(); print(\"unreached\"); } \
                         catch (e) { print(e.code); } finally { print(\"done\"); }");
    assert_eq!(out, "7\ndone\n");

    let out = output_of("try { throw \"x\"; } catch { print($e); }");
    assert_eq!(out, "x\n");

    assert!(error_of("throw \"boom\";").contains("boom"));
}

#[test]
fn main_runs_after_top_level() {
    let out = output_of("func main() { print(\"main\"); } print(\"top\");");
    assert_eq!(out, "top\nmain\n");
}

#[test]
fn parse_failures() {
    assert_failure("let = 5;");
    assert_failure("let s = \"abc;");
    assert_failure("print(1 +);");
    assert_failure("const x;");
    assert_failure("1 = 2;");
    assert_failure("class A { let self; }");
    assert!(error_of("let x = 1;\nlet = 2;").starts_with("Error on line 2"));
}

#[test]
fn runtime_failures() {
    assert!(error_of("let y = x + 1;").contains("Undeclared variable: x"));
    assert_failure("let x = 1 / 0;");
    assert_failure("let x = 5 % 0;");
    assert_failure("let x = 1; x();");
    assert_failure("const k = 1; k = 2;");
    assert_failure("let a = [1]; print(a[3]);");
    assert_failure("print(len());");
    assert_failure("break;");
    assert_failure("let m = monitor(); unlock(m);");
    assert_failure("let s = semaphore(1); release(s);");
    assert_failure("assert(1 == 2, \"math broke\");");
    assert_failure("print(nil + 1);");
    assert_failure("let a = []; a[1e15] = 1;");
    assert_failure("let a = [1]; a.insert_at(1e15, 2);");
    assert_failure("let r = range(1e16, 1e16 + 2);");
    assert_failure("let r = range(0, 1, 0);");
}

#[test]
fn failed_parse_runs_nothing() {
    let output = Output::buffer();
    let runtime = Arc::new(Runtime::with_output(output.clone()));
    let result = run_source("print(\"x\");\nlet = 5;", runtime, None);

    assert!(result.unwrap_err().to_string().starts_with("Error on line 2"));
    assert_eq!(output.contents(), "");
}

#[test]
fn tracked_tasks_share_state_under_a_semaphore() {
    assert_success("let mutex = semaphore(1); \
                    let done = semaphore(4); \
                    for (let i = 0; i < 4; i++) { acquire(done); } \
                    let counter = 0; \
                    func worker() { \
                      for (let j = 0; j < 100; j++) { \
                        acquire(mutex); counter = counter + 1; release(mutex); \
                      } \
                      release(done); \
                    } \
                    for (let i = 0; i < 4; i++) { r2(worker); } \
                    for (let i = 0; i < 4; i++) { acquire(done); } \
                    assert(counter == 400);");
}

#[test]
fn monitor_hands_off_between_tasks() {
    assert_success("let m = monitor(); let queue = []; let got = 0; \
                    let finished = semaphore(1); acquire(finished); \
                    func consumer() { \
                      lock(m); \
                      while (queue.len() == 0) { wait(m); } \
                      got = queue.pop(); \
                      unlock(m); \
                      release(finished); \
                    } \
                    r2(consumer); \
                    sleep(0.01); \
                    lock(m); queue.push(7); signal(m); unlock(m); \
                    acquire(finished); \
                    assert(got == 7);");
}

#[test]
fn program_waits_for_tracked_tasks() {
    let output = Output::buffer();
    let runtime = Arc::new(Runtime::with_output(output.clone()));
    run_source("r2(func(x) { sleep(0.02); print(\"task\", x); }, 1); print(\"top\");",
               Arc::clone(&runtime),
               None).unwrap();

    assert_eq!(output.contents(), "top\ntask 1\n");
    assert_eq!(runtime.tasks.active(), 0);
}

#[test]
fn failing_task_does_not_stop_the_program() {
    let output = Output::buffer();
    let runtime = Arc::new(Runtime::with_output(output.clone()));
    run_source("r2(func() { throw \"boom\"; }); r2(func() { let x = 1 / 0; }); print(\"ok\");",
               Arc::clone(&runtime),
               None).unwrap();

    assert_eq!(output.contents(), "ok\n");
    assert_eq!(runtime.tasks.failures(), 2);
}

#[test]
fn failing_detached_task_is_recovered() {
    let output = Output::buffer();
    let runtime = Arc::new(Runtime::with_output(output.clone()));
    run_source("let started = semaphore(1); acquire(started); \
                go(func() { release(started); throw \"boom\"; }); \
                waitAll(started); \
                print(\"after\");",
               Arc::clone(&runtime),
               None).unwrap();

    assert_eq!(output.contents(), "after\n");

    let deadline = Instant::now() + Duration::from_secs(5);
    while runtime.tasks.failures() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(runtime.tasks.failures(), 1);
}

#[test]
fn wait_all_on_a_monitor_wakes_every_waiter() {
    let out = output_of("let m = monitor(); let ready = 0; let woken = 0; let released = false; \
                         let done = semaphore(3); \
                         for (let i = 0; i < 3; i++) { acquire(done); } \
                         func waiter() { \
                           lock(m); ready++; \
                           while (!released) { wait(m); } \
                           woken++; unlock(m); release(done); \
                         } \
                         for (let i = 0; i < 3; i++) { r2(waiter); } \
                         lock(m); \
                         while (ready < 3) { unlock(m); sleep(0.005); lock(m); } \
                         released = true; unlock(m); \
                         waitAll(m); \
                         for (let i = 0; i < 3; i++) { acquire(done); } \
                         print(woken);");
    assert_eq!(out, "3\n");
}

#[test]
fn imports_resolve_relative_to_the_script() {
    let dir = scratch_dir("imports");
    fs::write(dir.join("lib.r2"),
              "let greeting = \"hi\"; func double(x) { return x * 2; }").unwrap();
    fs::write(dir.join("main.r2"),
              "import \"lib.r2\" as lib; print(lib.double(21), lib.greeting); \
               import \"lib.r2\"; print(double(2));").unwrap();

    let output = Output::buffer();
    let runtime = Arc::new(Runtime::with_output(output.clone()));
    let source = fs::read_to_string(dir.join("main.r2")).unwrap();
    run_source(&source, runtime, Some(dir.clone())).unwrap();

    assert_eq!(output.contents(), "42 hi\n4\n");
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn import_failures() {
    let dir = scratch_dir("cycles");
    fs::write(dir.join("a.r2"), "import \"b.r2\";").unwrap();
    fs::write(dir.join("b.r2"), "import \"a.r2\";").unwrap();
    fs::write(dir.join("main.r2"), "import \"a.r2\";").unwrap();
    fs::write(dir.join("missing.r2"), "import \"nope.r2\";").unwrap();

    assert!(run_file(&dir.join("main.r2")).is_err());
    assert!(run_file(&dir.join("missing.r2")).is_err());
    assert!(run_file(Path::new("no/such/script.r2")).is_err());
    fs::remove_dir_all(&dir).unwrap();
}
