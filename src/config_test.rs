use super::*;
use crate::theme::ThemeBase;

fn store() -> (tempfile::TempDir, ConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("conf"));
    (dir, store)
}

#[test]
fn load_creates_missing_files_with_defaults() {
    let (_dir, store) = store();
    let settings = store.load().unwrap();

    assert!(store.host_path().exists());
    assert!(store.app_path().exists());
    assert_eq!(settings.host.theme, Theme::dark());
    assert_eq!(settings.theme_status(), ThemeStatus::Dark);
    assert_eq!(settings.app.menu.orientation, Orientation::Vertical);
    assert!(!settings.app.menu.wide_mode);
    assert!(settings.app.menu.use_multi_icon_menu);
    assert_eq!(settings.app.llm.large_model, DEFAULT_LARGE_MODEL);
    assert_eq!(settings.app.llm.small_model, DEFAULT_SMALL_MODEL);
}

#[test]
fn default_host_file_disables_sidebar() {
    let (_dir, store) = store();
    store.load().unwrap();
    let text = fs::read_to_string(store.host_path()).unwrap();
    assert!(text.contains("show_sidebar_navigation = false"));
}

#[test]
fn enabled_sidebar_is_forced_off_and_rewritten() {
    let (_dir, store) = store();
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.host_path(), "[client]\nshow_sidebar_navigation = true\n").unwrap();

    store.load().unwrap();
    let text = fs::read_to_string(store.host_path()).unwrap();
    assert!(text.contains("show_sidebar_navigation = false"));
}

#[test]
fn partial_theme_is_filled_from_base_preset() {
    let (_dir, store) = store();
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.host_path(), "[theme]\nbase = \"light\"\nprimaryColor = \"#123456\"\n").unwrap();

    let settings = store.load().unwrap();
    assert_eq!(settings.host.theme.base, ThemeBase::Light);
    assert_eq!(settings.host.theme.primary_color, "#123456");
    assert_eq!(settings.host.theme.background_color, "#FFFFFF");
    assert_eq!(settings.theme_status(), ThemeStatus::Custom);
}

#[test]
fn partial_app_config_uses_section_defaults() {
    let (_dir, store) = store();
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.app_path(), "[llm]\nanthropic_api_key = \"sk-ant\"\nlarge_model = \"claude-3-haiku-20240307\"\n")
        .unwrap();

    let settings = store.load().unwrap();
    assert_eq!(settings.app.llm.anthropic_api_key, "sk-ant");
    assert_eq!(settings.app.llm.large_model, "claude-3-haiku-20240307");
    assert_eq!(settings.app.llm.small_model, DEFAULT_SMALL_MODEL);
    assert_eq!(settings.app.menu, MenuSettings::default());
}

#[tokio::test]
async fn save_app_round_trips_and_cleans_db_path() {
    let (_dir, store) = store();
    let mut app = AppConfig::default();
    app.menu.orientation = Orientation::Horizontal;
    app.database.db_file_path = "/Users/me/My\\ Data/db.sqlite".into();
    app.assistant.persona = Persona::Helpful;
    store.save_app(&app).await.unwrap();

    let settings = store.load().unwrap();
    assert_eq!(settings.app.menu.orientation, Orientation::Horizontal);
    assert_eq!(settings.app.database.db_file_path, "/Users/me/My Data/db.sqlite");
    assert_eq!(settings.app.assistant.persona, Persona::Helpful);
}

#[test]
fn malformed_file_reports_parse_error() {
    let (_dir, store) = store();
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.app_path(), "[menu\norientation = ").unwrap();

    let err = store.load().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn clean_path_string_unescapes() {
    assert_eq!(clean_path_string("a\\ b"), "a b");
    assert_eq!(clean_path_string("c:\\\\data"), "c:data");
    assert_eq!(clean_path_string("/plain/path"), "/plain/path");
}

#[test]
fn uppercase_section_names_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path());
    fs::write(store.app_path(), "[LLM]\nopenai_api_key = \"sk-up\"\n\n[RAG]\nexa_ai_api_key = \"exa\"\n").unwrap();

    let settings = store.load().unwrap();
    assert_eq!(settings.app.llm.openai_api_key, "sk-up");
    assert_eq!(settings.app.rag.exa_ai_api_key, "exa");
}

#[tokio::test]
async fn save_host_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("nested").join("config"));
    store.save_host(&HostConfig { theme: crate::theme::Theme::light() }).await.unwrap();
    assert_eq!(store.load().unwrap().host.theme, crate::theme::Theme::light());
}

#[test]
fn option_menu_section_name_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path());
    fs::write(
        store.app_path(),
        "[streamlit-option-menu]\norientation = \"horizontal\"\nwide_mode = true\n",
    )
    .unwrap();
    let settings = store.load().unwrap();
    assert_eq!(settings.app.menu.orientation, Orientation::Horizontal);
    assert!(settings.app.menu.wide_mode);
    assert!(settings.app.menu.use_multi_icon_menu);
}

#[test]
fn assistant_resumes_last_chat_by_default() {
    let settings: AppConfig = toml::from_str("[assistant]\npersona = \"helpful\"\n").unwrap();
    assert!(settings.assistant.resume_last_chat);
    let off: AppConfig = toml::from_str("[assistant]\nresume_last_chat = false\n").unwrap();
    assert!(!off.assistant.resume_last_chat);
}
