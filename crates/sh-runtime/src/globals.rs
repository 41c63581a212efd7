//! Names injected into every script scope. Script authors rely on them, so
//! they must stay stable.

pub const HOST: &str = "__host__";
pub const UI_CONTROLLED_APP: &str = "__uicontrolledapp__";
pub const VARS: &str = "__vars__";
pub const FILE: &str = "__file__";
pub const NAME: &str = "__name__";
pub const ARGS: &str = "__args__";
pub const MESSAGE: &str = "__message__";
pub const RESULT: &str = "__result__";
pub const RESULTS: &str = "__results__";
pub const EVENT_ARGS: &str = "__eventargs__";
pub const ELEMENTS: &str = "__elements__";
pub const EXEC_ID: &str = "__execid__";
pub const CONFIG_MODE: &str = "__configmode__";
pub const DEBUG_MODE: &str = "__debugmode__";
pub const FROM_UI: &str = "__fromui__";
pub const ENV: &str = "__env__";

/// Value of `__name__` for the entry unit.
pub const MAIN_MODULE: &str = "__main__";

/// Script function that ends a run early without failing it.
pub const EXIT_FN: &str = "exit";
