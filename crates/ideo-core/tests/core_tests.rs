use ideo_core::config::{MemoryBackend, Settings};
use ideo_core::session::ScriptedPrompt;
use ideo_core::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn new_session() -> (Session, MemoryBackend) {
    new_session_with(Settings::default())
}

fn new_session_with(settings: Settings) -> (Session, MemoryBackend) {
    let backend = MemoryBackend::with_settings(settings);
    let session = Session::new(StateStore::open(backend.clone()));
    (session, backend)
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ========================================================================
// Document Tests (document.rs)
// ========================================================================

#[test]
fn test_untitled_document_dirty_iff_non_empty() {
    let mut doc = Document::new_untitled();
    assert!(!doc.is_dirty());
    assert_eq!(doc.state(), DocumentState::UnsavedEmpty);

    doc.set_text("print('hi')");
    assert!(doc.is_dirty());
    assert_eq!(doc.state(), DocumentState::UnsavedDirty);

    doc.set_text("");
    assert!(!doc.is_dirty());
}

#[test]
fn test_loaded_document_is_clean_until_edited() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "main.c", "int main() { return 0; }\n");

    let mut doc = Document::load(&path).unwrap();
    assert!(!doc.is_dirty());
    assert_eq!(doc.state(), DocumentState::SavedClean);
    assert_eq!(doc.path(), Some(path.as_path()));

    doc.set_text("int main() { return 1; }\n");
    assert_eq!(doc.state(), DocumentState::SavedDirty);

    // Typing the original text back makes it clean again.
    doc.set_text("int main() { return 0; }\n");
    assert!(!doc.is_dirty());
}

#[test]
fn test_load_replaces_invalid_utf8() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("latin1.txt");
    std::fs::write(&path, b"caf\xe9\n").unwrap();

    let doc = Document::load(&path).unwrap();
    assert_eq!(doc.text(), "caf\u{FFFD}\n");
    assert!(!doc.is_dirty());
}

#[test]
fn test_load_missing_file_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let err = Document::load(tmp.path().join("missing.py")).unwrap_err();
    assert!(matches!(err, IdeError::Io { .. }));
}

#[test]
fn test_save_then_reload_is_identical() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "x = 1\r\ny = 2\n\n");

    let mut doc = Document::load(&path).unwrap();
    doc.save(None).unwrap();
    let reloaded = Document::load(&path).unwrap();

    assert_eq!(reloaded.text(), "x = 1\r\ny = 2\n\n");
    assert_eq!(reloaded.text(), doc.text());
}

#[test]
fn test_save_untitled_requires_path() {
    let mut doc = Document::new_untitled();
    doc.set_text("hello");
    let err = doc.save(None).unwrap_err();
    assert!(matches!(err, IdeError::MissingPath));
    assert!(doc.is_untitled());
}

#[test]
fn test_save_untitled_records_path_and_cleans() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("new.py");

    let mut doc = Document::new_untitled();
    doc.set_text("print(1)\n");
    let saved = doc.save(Some(&target)).unwrap();

    assert_eq!(saved, target);
    assert_eq!(doc.path(), Some(target.as_path()));
    assert!(!doc.is_dirty());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "print(1)\n");
}

#[test]
fn test_document_title_and_language() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "Main.java", "class Main {}");

    let doc = Document::load(&path).unwrap();
    assert_eq!(doc.title(), "Main.java");
    assert_eq!(doc.language(), Some(Language::Java));
    assert_eq!(Document::new_untitled().title(), "Untitled");
    assert_eq!(Document::new_untitled().language(), None);
}

// ========================================================================
// Command Builder Tests (command.rs)
// ========================================================================

#[test]
fn test_build_python_commands() {
    assert_eq!(build_command(BuildAction::Run, "foo.py").unwrap(), "python foo.py");
    assert_eq!(
        build_command(BuildAction::Compile, "foo.py").unwrap(),
        "python -m py_compile foo.py"
    );
}

#[test]
fn test_build_c_commands() {
    assert_eq!(
        build_command(BuildAction::Compile, "foo.c").unwrap(),
        "gcc foo.c -o foo"
    );
    let run = build_command(BuildAction::Run, "foo.c").unwrap();
    assert!(run.starts_with("gcc foo.c -o foo && "));
    assert!(run.ends_with("foo"));
}

#[test]
fn test_build_c_run_with_directory() {
    assert_eq!(
        build_command(BuildAction::Run, "/src/prog.c").unwrap(),
        "gcc /src/prog.c -o /src/prog && /src/prog"
    );
}

#[test]
fn test_build_cpp_commands() {
    assert_eq!(
        build_command(BuildAction::Compile, "/work/foo.cpp").unwrap(),
        "g++ /work/foo.cpp -o /work/foo"
    );
    assert_eq!(
        build_command(BuildAction::Run, "/work/foo.cpp").unwrap(),
        "/work/foo"
    );
}

#[test]
fn test_build_java_commands() {
    assert_eq!(
        build_command(BuildAction::Compile, "foo.java").unwrap(),
        "javac foo.java"
    );

    let run = build_command(BuildAction::Run, "foo.java").unwrap();
    assert!(run.contains("javac"));
    assert!(run.contains("java -cp"));
    assert!(run.ends_with(" foo"));

    assert_eq!(
        build_command(BuildAction::Run, "/proj/src/Hello.java").unwrap(),
        "javac -d /proj/src /proj/src/Hello.java && java -cp /proj/src Hello"
    );
}

#[test]
fn test_build_unsupported_extension() {
    for action in [BuildAction::Compile, BuildAction::Run] {
        let err = build_command(action, "foo.txt").unwrap_err();
        assert!(matches!(err, IdeError::UnsupportedLanguage(ref ext) if ext == ".txt"));
    }
    assert!(matches!(
        build_command(BuildAction::Run, "Makefile"),
        Err(IdeError::UnsupportedLanguage(_))
    ));
}

#[test]
fn test_extension_match_is_case_sensitive() {
    assert!(Language::from_path(std::path::Path::new("FOO.PY")).is_none());
    assert_eq!(
        Language::from_path(std::path::Path::new("foo.cpp")),
        Some(Language::Cpp)
    );
}

#[test]
fn test_custom_toolchain() {
    let builder = CommandBuilder::new(Toolchain {
        python: "python3".to_string(),
        ..Toolchain::default()
    });
    assert_eq!(
        builder
            .build(BuildAction::Run, std::path::Path::new("foo.py"))
            .unwrap(),
        "python3 foo.py"
    );
}

#[test]
fn test_run_request_from_path() {
    let request = RunRequest::from_path("/a/b.c").unwrap();
    assert_eq!(request.language, Language::C);
    assert_eq!(request.source_path, PathBuf::from("/a/b.c"));
}

// ========================================================================
// Settings Tests (config/)
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.session.last_theme, "Light");
    assert!(settings.session.last_file.is_none());
    assert!(settings.session.last_dir.is_none());
    assert!(settings.session.last_files.is_empty());
    assert!(!settings.terminal.shell.is_empty());
    assert!(settings.terminal.timeout().is_none());
    assert_eq!(settings.toolchain.python, "python");
    assert_eq!(settings.toolchain.gxx, "g++");
}

#[test]
fn test_settings_save_and_reload_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ideo").join("settings.toml");

    let mut settings = Settings::default();
    settings.session.last_file = Some(PathBuf::from("/tmp/a.py"));
    settings.session.last_dir = Some(PathBuf::from("/tmp"));
    settings.session.last_theme = "Dark".to_string();
    settings.session.last_files = vec![PathBuf::from("/tmp/a.py"), PathBuf::from("/tmp/b.c")];
    settings.terminal.timeout_secs = Some(30);

    settings.save_to(&path).unwrap();
    let loaded = Settings::load_from(&path);

    assert_eq!(loaded, settings);
}

#[test]
fn test_settings_missing_file_gives_defaults() {
    let tmp = TempDir::new().unwrap();
    let loaded = Settings::load_from(&tmp.path().join("nope.toml"));
    assert_eq!(loaded, Settings::default());
}

#[test]
fn test_settings_malformed_file_gives_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "settings.toml", "this is = = not toml");
    assert_eq!(Settings::load_from(&path), Settings::default());
}

#[test]
fn test_settings_partial_file_fills_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(
        &tmp,
        "settings.toml",
        "[session]\nlast_theme = \"Dark\"\n\n[toolchain]\npython = \"python3\"\n",
    );

    let loaded = Settings::load_from(&path);
    assert_eq!(loaded.session.last_theme, "Dark");
    assert!(loaded.session.last_files.is_empty());
    assert_eq!(loaded.toolchain.python, "python3");
    assert_eq!(loaded.toolchain.gcc, "gcc");
}

#[test]
fn test_state_store_writes_through() {
    let backend = MemoryBackend::default();
    let mut store = StateStore::open(backend.clone());

    store.set_last_theme("Dark");
    store.set_last_dir(std::path::Path::new("/work"));

    assert_eq!(backend.write_count(), 2);
    let written = backend.snapshot();
    assert_eq!(written.session.last_theme, "Dark");
    assert_eq!(written.session.last_dir, Some(PathBuf::from("/work")));
}

#[test]
fn test_file_backend_roundtrip() {
    use ideo_core::config::{FileBackend, StateBackend};

    let tmp = TempDir::new().unwrap();
    let backend = FileBackend::new(tmp.path().join("settings.toml"));
    let mut store = StateStore::open(FileBackend::new(backend.path()));
    store.set_last_theme("Dark");

    assert_eq!(backend.load().session.last_theme, "Dark");
}

#[test]
fn test_file_backend_moves_malformed_settings_aside_before_writing() {
    use ideo_core::config::FileBackend;

    let tmp = TempDir::new().unwrap();
    let original = "[toolchain]\npython = \"python3\"\n\n[session\n";
    let path = write_file(&tmp, "settings.toml", original);
    let backend = FileBackend::new(&path);
    let backup = backend.backup_path();

    let mut store = StateStore::open(backend);
    assert_eq!(store.settings().toolchain.python, "python");
    store.set_last_file(&tmp.path().join("a.py"));

    assert_eq!(backup, tmp.path().join("settings.toml.bak"));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
    let rewritten = Settings::load_from(&path);
    assert_eq!(rewritten.session.last_file, Some(tmp.path().join("a.py")));

    // Later writes replace the new file only; the backup is left alone.
    store.set_last_theme("Dark");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
    assert_eq!(Settings::load_from(&path).session.last_theme, "Dark");
}

#[test]
fn test_file_backend_valid_settings_are_not_backed_up() {
    use ideo_core::config::FileBackend;

    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "settings.toml", "[toolchain]\npython = \"python3\"\n");
    let backend = FileBackend::new(&path);
    let backup = backend.backup_path();

    let mut store = StateStore::open(backend);
    store.set_last_theme("Dark");

    assert!(!backup.exists());
    let saved = Settings::load_from(&path);
    assert_eq!(saved.toolchain.python, "python3");
    assert_eq!(saved.session.last_theme, "Dark");
}

#[test]
fn test_settings_try_load_reports_malformed_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "settings.toml", "[session\n");
    assert!(matches!(
        Settings::try_load_from(&path),
        Err(IdeError::Config(_))
    ));
    assert!(matches!(
        Settings::try_load_from(&tmp.path().join("none.toml")),
        Ok(None)
    ));
}

#[test]
fn test_settings_save_leaves_no_temp_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("settings.toml");
    Settings::default().save_to(&path).unwrap();

    let names: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["settings.toml".to_string()]);
}

// ========================================================================
// Theme Tests (theme.rs)
// ========================================================================

#[test]
fn test_theme_parse() {
    assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
    assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
    assert!(matches!(
        "solarized".parse::<Theme>(),
        Err(IdeError::UnknownTheme(_))
    ));
}

#[test]
fn test_load_theme_reads_text() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "dark.css", "QWidget { background: #222; }");
    assert_eq!(
        theme::load_theme(&path).unwrap(),
        "QWidget { background: #222; }"
    );
    assert!(theme::load_theme(&tmp.path().join("none.css")).is_err());
}

#[test]
fn test_session_stylesheet_follows_theme() {
    let tmp = TempDir::new().unwrap();
    let dark = write_file(&tmp, "dark.css", "dark");
    let mut settings = Settings::default();
    settings.theme.dark_stylesheet = Some(dark);

    let (mut session, _) = new_session_with(settings);
    assert_eq!(session.stylesheet().unwrap(), None);

    session.set_theme(Theme::Dark);
    assert_eq!(session.stylesheet().unwrap(), Some("dark".to_string()));
}

// ========================================================================
// Session Tests (session/)
// ========================================================================

#[test]
fn test_open_new_appends_and_activates() {
    let (mut session, _) = new_session();
    assert!(session.is_empty());
    assert_eq!(session.active_index(), None);

    assert_eq!(session.open_new(), 0);
    assert_eq!(session.open_new(), 1);
    assert_eq!(session.active_index(), Some(1));
    assert_eq!(session.len(), 2);
}

#[test]
fn test_open_path_records_last_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "x = 1\n");
    let (mut session, backend) = new_session();

    let index = session.open_path(&path).unwrap();

    assert_eq!(index, 0);
    assert_eq!(session.active().unwrap().text(), "x = 1\n");
    assert_eq!(backend.snapshot().session.last_file, Some(path));
}

#[test]
fn test_open_path_failure_leaves_session_unchanged() {
    let tmp = TempDir::new().unwrap();
    let (mut session, backend) = new_session();
    session.open_new();

    let err = session.open_path(tmp.path().join("missing.c")).unwrap_err();

    assert!(matches!(err, IdeError::Io { .. }));
    assert_eq!(session.len(), 1);
    assert_eq!(session.active_index(), Some(0));
    assert!(backend.snapshot().session.last_file.is_none());
}

#[test]
fn test_open_same_path_twice_focuses_existing_tab() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "");
    let (mut session, _) = new_session();

    session.open_path(&path).unwrap();
    session.open_new();
    assert_eq!(session.open_path(&path).unwrap(), 0);
    assert_eq!(session.len(), 2);
    assert_eq!(session.active_index(), Some(0));
}

#[test]
fn test_save_as_path_open_in_another_tab_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "original\n");
    let (mut session, _) = new_session();

    session.open_path(&path).unwrap();
    session.open_new();
    session.edit_active("other\n").unwrap();

    let err = session.save_active_as(&path).unwrap_err();
    assert!(matches!(err, IdeError::AlreadyOpen(p) if p == path));
    assert_eq!(session.len(), 2);
    assert_eq!(session.open_files(), vec![path.clone()]);
    assert!(session.documents()[1].is_untitled());
    assert!(session.documents()[1].is_dirty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "original\n");
}

#[test]
fn test_save_untitled_to_path_open_in_another_tab_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "original\n");
    let (mut session, _) = new_session();

    session.open_path(&path).unwrap();
    session.open_new();
    session.edit_active("other\n").unwrap();

    let mut prompt = ScriptedPrompt::new().save_as(&path);
    assert!(matches!(
        session.save_active(&mut prompt),
        Err(IdeError::AlreadyOpen(_))
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "original\n");
}

#[test]
fn test_save_as_own_path_is_allowed() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "original\n");
    let (mut session, _) = new_session();

    session.open_path(&path).unwrap();
    session.edit_active("changed\n").unwrap();

    assert_eq!(session.save_active_as(&path).unwrap(), path);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "changed\n");
}

#[test]
fn test_set_active_is_pure_selection() {
    let (mut session, _) = new_session();
    session.open_new();
    session.edit_active("unsaved").unwrap();
    session.open_new();

    session.set_active(0).unwrap();
    assert_eq!(session.active_index(), Some(0));
    assert!(session.active().unwrap().is_dirty());

    assert!(matches!(session.set_active(5), Err(IdeError::InvalidIndex(5))));
    assert_eq!(session.active_index(), Some(0));
}

#[test]
fn test_next_and_previous_tab_wrap() {
    let (mut session, _) = new_session();
    session.next_tab();
    assert_eq!(session.active_index(), None);

    session.open_new();
    session.open_new();
    session.open_new();
    session.next_tab();
    assert_eq!(session.active_index(), Some(0));
    session.previous_tab();
    assert_eq!(session.active_index(), Some(2));
}

#[test]
fn test_close_dirty_cancel_leaves_state_unchanged() {
    let (mut session, _) = new_session();
    session.open_new();
    session.open_new();
    session.edit_active("draft").unwrap();
    session.set_active(1).unwrap();

    let mut prompt = ScriptedPrompt::new().respond(PromptResponse::Cancel);
    let err = session.close(1, &mut prompt).unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(session.len(), 2);
    assert_eq!(session.active_index(), Some(1));
    assert_eq!(session.documents()[1].text(), "draft");
    assert_eq!(prompt.asked().len(), 1);
    assert_eq!(prompt.asked()[0].1, PromptReason::CloseTab);
}

#[test]
fn test_close_dirty_discard_does_not_save() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "original\n");
    let (mut session, backend) = new_session();
    session.open_path(&path).unwrap();
    session.edit_active("changed\n").unwrap();
    let writes_before = backend.write_count();

    let mut prompt = ScriptedPrompt::new().respond(PromptResponse::Discard);
    session.close(0, &mut prompt).unwrap();

    assert!(session.is_empty());
    assert_eq!(session.active_index(), None);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "original\n");
    assert_eq!(backend.write_count(), writes_before);
}

#[test]
fn test_close_dirty_save_writes_then_closes() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "original\n");
    let (mut session, _) = new_session();
    session.open_path(&path).unwrap();
    session.edit_active("changed\n").unwrap();

    let mut prompt = ScriptedPrompt::new().respond(PromptResponse::Save);
    session.close(0, &mut prompt).unwrap();

    assert!(session.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "changed\n");
}

#[test]
fn test_close_untitled_save_without_path_cancels() {
    let (mut session, _) = new_session();
    session.open_new();
    session.edit_active("draft").unwrap();

    let mut prompt = ScriptedPrompt::new().respond(PromptResponse::Save);
    let err = session.close(0, &mut prompt).unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(session.len(), 1);
    assert!(session.active().unwrap().is_dirty());
}

#[test]
fn test_close_untitled_save_with_path() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("draft.py");
    let (mut session, backend) = new_session();
    session.open_new();
    session.edit_active("print(1)\n").unwrap();

    let mut prompt = ScriptedPrompt::new()
        .respond(PromptResponse::Save)
        .save_as(&target);
    session.close(0, &mut prompt).unwrap();

    assert!(session.is_empty());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "print(1)\n");
    assert_eq!(backend.snapshot().session.last_file, Some(target));
}

#[test]
fn test_close_clean_document_does_not_prompt() {
    let (mut session, _) = new_session();
    session.open_new();

    let mut prompt = ScriptedPrompt::new();
    session.close(0, &mut prompt).unwrap();

    assert!(prompt.asked().is_empty());
    assert!(session.is_empty());
}

#[test]
fn test_close_active_moves_to_predecessor() {
    let (mut session, _) = new_session();
    for _ in 0..3 {
        session.open_new();
    }
    let mut prompt = ScriptedPrompt::new();

    session.close(2, &mut prompt).unwrap();
    assert_eq!(session.active_index(), Some(1));

    session.set_active(0).unwrap();
    session.close(0, &mut prompt).unwrap();
    assert_eq!(session.active_index(), Some(0));

    session.close(0, &mut prompt).unwrap();
    assert_eq!(session.active_index(), None);
}

#[test]
fn test_close_before_active_shifts_index() {
    let (mut session, _) = new_session();
    for _ in 0..3 {
        session.open_new();
    }
    let mut prompt = ScriptedPrompt::new();

    session.close(0, &mut prompt).unwrap();
    assert_eq!(session.active_index(), Some(1));

    session.close(1, &mut prompt).unwrap();
    assert_eq!(session.active_index(), Some(0));
}

#[test]
fn test_close_after_active_keeps_index() {
    let (mut session, _) = new_session();
    for _ in 0..3 {
        session.open_new();
    }
    session.set_active(0).unwrap();

    session.close(2, &mut ScriptedPrompt::new()).unwrap();
    assert_eq!(session.active_index(), Some(0));
}

#[test]
fn test_close_invalid_index() {
    let (mut session, _) = new_session();
    let err = session.close(0, &mut ScriptedPrompt::new()).unwrap_err();
    assert!(matches!(err, IdeError::InvalidIndex(0)));
}

#[test]
fn test_save_active_untitled_asks_for_path() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("x.c");
    let (mut session, backend) = new_session();
    session.open_new();
    session.edit_active("int x;\n").unwrap();

    let mut declined = ScriptedPrompt::new();
    assert!(session.save_active(&mut declined).unwrap_err().is_cancelled());
    assert!(session.active().unwrap().is_untitled());

    let mut prompt = ScriptedPrompt::new().save_as(&target);
    let saved = session.save_active(&mut prompt).unwrap();

    assert_eq!(saved, target);
    assert!(!session.active().unwrap().is_dirty());
    assert_eq!(backend.snapshot().session.last_file, Some(target));
}

#[test]
fn test_save_active_with_nothing_open() {
    let (mut session, _) = new_session();
    let err = session.save_active(&mut ScriptedPrompt::new()).unwrap_err();
    assert!(matches!(err, IdeError::NoActiveDocument));
}

#[test]
fn test_command_for_untitled_is_not_saved() {
    let (mut session, _) = new_session();
    session.open_new();
    session.edit_active("print(1)").unwrap();

    let err = session.command_for_active(BuildAction::Run).unwrap_err();
    assert!(matches!(err, IdeError::NotSaved));
}

#[test]
fn test_command_for_dirty_file_is_not_saved() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "x = 1\n");
    let (mut session, _) = new_session();
    session.open_path(&path).unwrap();
    session.edit_active("x = 2\n").unwrap();

    assert!(matches!(
        session.command_for_active(BuildAction::Compile),
        Err(IdeError::NotSaved)
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "x = 1\n");
}

#[test]
fn test_command_for_saved_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "x = 1\n");
    let (mut session, _) = new_session();
    session.open_path(&path).unwrap();

    let command = session.command_for_active(BuildAction::Run).unwrap();
    assert_eq!(command, format!("python {}", path.display()));
}

#[test]
fn test_command_for_unsupported_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "notes.txt", "hello");
    let (mut session, _) = new_session();
    session.open_path(&path).unwrap();

    assert!(matches!(
        session.command_for_active(BuildAction::Run),
        Err(IdeError::UnsupportedLanguage(_))
    ));
}

#[test]
fn test_command_with_nothing_open() {
    let (session, _) = new_session();
    assert!(matches!(
        session.command_for_active(BuildAction::Run),
        Err(IdeError::NoActiveDocument)
    ));
}

#[test]
fn test_shutdown_records_saved_paths_only() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(&tmp, "a.py", "");
    let b = write_file(&tmp, "b.c", "");
    let (mut session, backend) = new_session();
    session.open_path(&a).unwrap();
    session.open_new();
    session.open_path(&b).unwrap();

    session.shutdown(&mut ScriptedPrompt::new()).unwrap();

    assert_eq!(backend.snapshot().session.last_files, vec![a, b]);
}

#[test]
fn test_shutdown_cancel_keeps_running() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(&tmp, "a.py", "");
    let (mut session, backend) = new_session();
    session.open_path(&a).unwrap();
    session.edit_active("changed").unwrap();

    let mut prompt = ScriptedPrompt::new().respond(PromptResponse::Cancel);
    let err = session.shutdown(&mut prompt).unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(session.len(), 1);
    assert!(backend.snapshot().session.last_files.is_empty());
}

#[test]
fn test_shutdown_asks_about_every_dirty_document() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(&tmp, "a.py", "");
    let b = write_file(&tmp, "b.py", "");
    let (mut session, _) = new_session();
    session.open_path(&a).unwrap();
    session.edit_active("1").unwrap();
    session.open_path(&b).unwrap();
    session.edit_active("2").unwrap();
    session.set_active(1).unwrap();

    let mut prompt = ScriptedPrompt::new()
        .respond(PromptResponse::Discard)
        .respond(PromptResponse::Save);
    session.shutdown(&mut prompt).unwrap();

    let asked: Vec<_> = prompt.asked().iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(asked, vec!["a.py", "b.py"]);
    assert_eq!(std::fs::read_to_string(&a).unwrap(), "");
    assert_eq!(std::fs::read_to_string(&b).unwrap(), "2");
}

#[test]
fn test_open_folder_checks_active_document_only() {
    let tmp = TempDir::new().unwrap();
    let (mut session, backend) = new_session();
    session.open_new();
    session.edit_active("dirty but inactive").unwrap();
    session.open_new();

    let mut prompt = ScriptedPrompt::new();
    session.open_folder(tmp.path(), &mut prompt).unwrap();

    assert!(prompt.asked().is_empty());
    assert_eq!(session.folder(), Some(tmp.path()));
    assert_eq!(
        backend.snapshot().session.last_dir,
        Some(tmp.path().to_path_buf())
    );
}

#[test]
fn test_open_folder_cancel_keeps_previous_folder() {
    let tmp = TempDir::new().unwrap();
    let (mut session, _) = new_session();
    session.open_new();
    session.edit_active("dirty").unwrap();

    let mut prompt = ScriptedPrompt::new().respond(PromptResponse::Cancel);
    let err = session.open_folder(tmp.path(), &mut prompt).unwrap_err();

    assert!(err.is_cancelled());
    assert!(session.folder().is_none());
    assert_eq!(prompt.asked()[0].1, PromptReason::OpenFolder);
}

#[test]
fn test_open_folder_rejects_files() {
    let tmp = TempDir::new().unwrap();
    let file = write_file(&tmp, "a.py", "");
    let (mut session, _) = new_session();

    let err = session
        .open_folder(&file, &mut ScriptedPrompt::new())
        .unwrap_err();
    assert!(matches!(err, IdeError::NotADirectory(_)));
}

#[test]
fn test_restore_reopens_last_session() {
    let tmp = TempDir::new().unwrap();
    let a = write_file(&tmp, "a.py", "a");
    let b = write_file(&tmp, "b.py", "b");
    let mut settings = Settings::default();
    settings.session.last_files = vec![a.clone(), tmp.path().join("gone.py"), b];
    settings.session.last_dir = Some(tmp.path().to_path_buf());
    settings.session.last_theme = "Dark".to_string();

    let (mut session, _) = new_session_with(settings);
    let reopened = session.restore();

    assert_eq!(reopened, 2);
    assert_eq!(session.len(), 2);
    assert_eq!(session.active_index(), Some(1));
    assert_eq!(session.documents()[0].path(), Some(a.as_path()));
    assert_eq!(session.folder(), Some(tmp.path()));
    assert_eq!(session.theme(), Theme::Dark);
}

#[test]
fn test_restore_ignores_missing_folder() {
    let tmp = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.session.last_dir = Some(tmp.path().join("gone"));

    let (mut session, _) = new_session_with(settings);
    session.restore();
    assert!(session.folder().is_none());
}

#[test]
fn test_unknown_stored_theme_falls_back_to_light() {
    let mut settings = Settings::default();
    settings.session.last_theme = "Purple".to_string();
    let (session, _) = new_session_with(settings);
    assert_eq!(session.theme(), Theme::Light);
}

#[test]
fn test_set_theme_persists() {
    let (mut session, backend) = new_session();
    session.set_theme(Theme::Dark);
    assert_eq!(backend.snapshot().session.last_theme, "Dark");
}

#[test]
fn test_window_title() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "a.py", "");
    let (mut session, _) = new_session();
    assert_eq!(session.window_title(), "IDEO");

    session.open_new();
    assert_eq!(session.window_title(), "IDEO");

    session.open_path(&path).unwrap();
    assert_eq!(session.window_title(), path.display().to_string());
}

// ========================================================================
// Dispatch Tests (session/dispatch.rs)
// ========================================================================

#[test]
fn test_dispatch_open_and_compile() {
    let tmp = TempDir::new().unwrap();
    let path = write_file(&tmp, "main.c", "int main() {}\n");
    let (mut session, _) = new_session();
    let mut prompt = ScriptedPrompt::new();

    let opened = session
        .dispatch(UserAction::Open(path.clone()), &mut prompt)
        .unwrap();
    assert_eq!(opened, ActionOutcome::Opened(0));

    let outcome = session.dispatch(UserAction::Compile, &mut prompt).unwrap();
    let stem = path.with_extension("");
    assert_eq!(
        outcome,
        ActionOutcome::Command(format!("gcc {} -o {}", path.display(), stem.display()))
    );
}

#[test]
fn test_dispatch_open_from_tree_ignores_directories() {
    let tmp = TempDir::new().unwrap();
    let (mut session, _) = new_session();

    let outcome = session
        .dispatch(
            UserAction::OpenFromTree(tmp.path().to_path_buf()),
            &mut ScriptedPrompt::new(),
        )
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Done);
    assert!(session.is_empty());
}

#[test]
fn test_dispatch_edit_then_run_is_not_saved() {
    let (mut session, _) = new_session();
    let mut prompt = ScriptedPrompt::new();
    session.dispatch(UserAction::New, &mut prompt).unwrap();
    session
        .dispatch(UserAction::Edit("print(1)".into()), &mut prompt)
        .unwrap();

    let err = session.dispatch(UserAction::Run, &mut prompt).unwrap_err();
    assert!(matches!(err, IdeError::NotSaved));
}

#[test]
fn test_dispatch_quit() {
    let (mut session, _) = new_session();
    let outcome = session
        .dispatch(UserAction::Quit, &mut ScriptedPrompt::new())
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Quit);
}

// ========================================================================
// CommandHistory Tests (runner/history.rs)
// ========================================================================

#[test]
fn test_history_navigation() {
    let mut history = CommandHistory::new();
    assert_eq!(history.previous(), None);

    history.push("ls");
    history.push("ls");
    history.push("   ");
    history.push("pwd");
    assert_eq!(history.len(), 2);

    assert_eq!(history.previous(), Some("pwd"));
    assert_eq!(history.previous(), Some("ls"));
    assert_eq!(history.previous(), Some("ls"));
    assert_eq!(history.next(), Some("pwd"));
    assert_eq!(history.next(), None);
    assert_eq!(history.next(), None);
}

#[test]
fn test_history_push_resets_position() {
    let mut history = CommandHistory::new();
    history.push("a");
    history.push("b");
    history.previous();
    history.previous();

    history.push("c");
    assert_eq!(history.previous(), Some("c"));
}

// ========================================================================
// File Tree Tests (project/)
// ========================================================================

#[test]
fn test_list_folder_lists_files() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp, "b.py", "");
    write_file(&tmp, "a.c", "");

    let entries = project::list_folder(tmp.path(), Some(1));
    let names: Vec<_> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["a.c".to_string(), "b.py".to_string()]);
    assert!(entries.iter().all(|e| !e.is_dir && e.depth == 1));
}
