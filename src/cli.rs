//! 命令行界面。每个子命令对应原桌面界面上的一个操作。

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::warn;
use serde_json::Value;

use crate::core::app_state::AppState;
use crate::core::hexagon::Hexagon;
use crate::core::notify::LogNotifier;
use crate::core::route::{Navigation, Route};
use crate::core::settings;
use crate::error::client::{ClientError, ErrorKind};
use crate::model::login_session::LoginSession;
use crate::model::queued_course::NewCourse;
use crate::model::selection::{CourseQuery, GrabRequest, SelectionRequest};
use crate::storage::local_store::{FileStore, KeyValueStore};
use crate::utils::input::{input, input_password};

#[derive(Parser, Debug)]
#[command(name = "hexagon", version, about = "Hexagon 选课客户端")]
pub struct Cli {
    /// 本地数据目录
    #[arg(long, global = true, env = settings::DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// 本次运行使用的 API 地址，不写入配置
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 登录并保存会话
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long, env = "HEXAGON_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        /// 同时保存账号密码
        #[arg(long)]
        save: bool,
        /// 已登录时也重新登录
        #[arg(long)]
        force: bool,
    },
    /// 清除当前会话
    Logout,
    /// 显示登录、连接与本地状态
    Status,
    /// 管理已保存的账号
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },
    /// 管理抢课列表
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// 查询可选课程
    Courses(CoursesArgs),
    /// 查询选课批次
    Batches,
    /// 查询系统参数
    SysParams,
    /// 选课
    Select(SelectionArgs),
    /// 退课
    Drop(SelectionArgs),
    /// 服务端轮询抢课
    Grab {
        #[command(subcommand)]
        action: GrabAction,
    },
    /// 主题设置
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// API 地址设置
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountsAction {
    List,
    Remove { username: String },
    /// 使用已保存的账号登录
    Use { username: String },
}

#[derive(Subcommand, Debug)]
pub enum QueueAction {
    List,
    Add(QueueAddArgs),
    Remove { id: String },
    Clear,
    /// 对列表中的每门课发起选课
    Submit,
}

#[derive(Args, Debug)]
pub struct QueueAddArgs {
    #[arg(long = "class")]
    pub teaching_class_id: String,
    #[arg(long = "batch")]
    pub elective_batch_code: String,
    #[arg(long = "name")]
    pub course_name: String,
    #[arg(long = "teacher", default_value = "")]
    pub teacher_name: String,
    #[arg(long = "class-type", default_value = "XGXK")]
    pub teaching_class_type: String,
    #[arg(long, default_value = "02")]
    pub campus: String,
    #[arg(long, default_value = "1")]
    pub is_major: String,
    #[arg(long = "place")]
    pub teaching_place: Option<String>,
    #[arg(long)]
    pub capacity: Option<String>,
    #[arg(long = "selected")]
    pub selected_count: Option<String>,
}

#[derive(Args, Debug)]
pub struct CoursesArgs {
    #[arg(long = "batch")]
    pub elective_batch_code: String,
    #[arg(long, default_value = "")]
    pub query: String,
    #[arg(long = "class-type", default_value = "XGXK")]
    pub teaching_class_type: String,
    #[arg(long, default_value = "02")]
    pub campus: String,
    #[arg(long, default_value = "1")]
    pub is_major: String,
}

#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    #[arg(long = "batch")]
    pub elective_batch_code: String,
    #[arg(long = "class")]
    pub teaching_class_id: String,
    #[arg(long = "class-type", default_value = "XGXK")]
    pub teaching_class_type: String,
    #[arg(long, default_value = "02")]
    pub campus: String,
    #[arg(long, default_value = "1")]
    pub is_major: String,
}

#[derive(Subcommand, Debug)]
pub enum GrabAction {
    Start {
        #[command(flatten)]
        selection: SelectionArgs,
        /// 轮询间隔（秒）
        #[arg(long, default_value_t = 2)]
        rate: u32,
        #[arg(long)]
        email_user: Option<String>,
        #[arg(long)]
        email_auth: Option<String>,
        #[arg(long)]
        email_msg: Option<String>,
    },
    Stop { task_id: String },
    Status { task_id: String },
}

#[derive(Subcommand, Debug)]
pub enum ThemeAction {
    Show,
    Toggle,
    Set { mode: ThemeMode },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ThemeMode {
    Light,
    Dark,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    Show,
    SetApiUrl { url: String },
}

impl SelectionArgs {
    fn to_request(&self, session: &LoginSession) -> SelectionRequest {
        SelectionRequest {
            is_major: self.is_major.clone(),
            campus: self.campus.clone(),
            teaching_class_type: self.teaching_class_type.clone(),
            ..SelectionRequest::new(session, &self.elective_batch_code, &self.teaching_class_id)
        }
    }
}

impl From<QueueAddArgs> for NewCourse {
    fn from(args: QueueAddArgs) -> Self {
        NewCourse {
            teaching_class_id: args.teaching_class_id,
            course_name: args.course_name,
            teacher_name: args.teacher_name,
            elective_batch_code: args.elective_batch_code,
            teaching_class_type: args.teaching_class_type,
            campus: args.campus,
            is_major: args.is_major,
            teaching_place: args.teaching_place,
            capacity: args.capacity,
            selected_count: args.selected_count,
        }
    }
}

fn print_json(value: &Value) -> Result<(), ClientError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// 进入需要登录的页面前检查登录信息
fn enter(state: &AppState, route: Route) -> Result<(), ClientError> {
    match state.navigate(route) {
        Navigation::Proceed(_) => Ok(()),
        Navigation::Redirect(Route::Login) => Err(ClientError::not_logged_in()),
        Navigation::Redirect(other) => Err(ClientError::new(
            ErrorKind::Other,
            format!("无法进入 {}，已跳转到 {}", route.path(), other.path()),
        )),
    }
}

async fn login(
    state: &mut AppState,
    api: &Hexagon,
    username: &str,
    password: &str,
    save: bool,
) -> Result<(), ClientError> {
    let session = api.login(username, password).await?;
    if save {
        state.accounts.save_account(username, password);
    }
    println!("{} 登录成功", session.username);
    Ok(())
}

pub async fn run(cli: Cli) -> Result<(), ClientError> {
    let data_dir = settings::resolve_data_dir(cli.data_dir);
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(settings::store_path(&data_dir))?);
    let mut state = AppState::init(store, Arc::new(LogNotifier));
    let api_url = cli.api_url.as_deref();

    match cli.command {
        Command::Login {
            username,
            password,
            save,
            force,
        } => {
            if let Navigation::Redirect(_) = state.navigate(Route::Login) {
                if !force {
                    let session = state.hexagon(api_url)?.session()?;
                    println!("已登录为 {}，使用 --force 重新登录", session.username);
                    return Ok(());
                }
            }
            let username = match username {
                Some(username) => username,
                None => input("请输入用户名：")?,
            };
            let password = match password {
                Some(password) => password,
                None => input_password("请输入密码：")?,
            };
            let api = state.hexagon(api_url)?;
            login(&mut state, &api, &username, &password, save).await?;
        }
        Command::Logout => {
            state.hexagon(api_url)?.logout()?;
            state.monitor.reset();
            println!("已退出登录");
        }
        Command::Status => {
            let api = state.hexagon(api_url)?;
            match api.session() {
                Ok(session) => println!("用户: {}", session.username),
                Err(_) => println!("用户: 未登录"),
            }
            println!("API: {}", api.base_url());
            if let Err(err) = api.ping().await {
                warn!("服务不可用: {}", err);
            }
            println!("连接: {}", state.monitor.status());
            println!("主题: {}", state.theme.theme());
            println!("抢课列表: {} 门", state.queue.len());
        }
        Command::Accounts { action } => match action {
            AccountsAction::List => {
                for account in state.accounts.accounts() {
                    let saved_at = chrono::DateTime::from_timestamp_millis(account.saved_at)
                        .map(|time| time.to_rfc3339())
                        .unwrap_or_default();
                    println!("{}\t{}", account.username, saved_at);
                }
            }
            AccountsAction::Remove { username } => {
                if state.accounts.remove_account(&username) {
                    println!("已删除账号 {}", username);
                } else {
                    println!("没有保存账号 {}", username);
                }
            }
            AccountsAction::Use { username } => {
                let account = state
                    .accounts
                    .get_account(&username)
                    .cloned()
                    .ok_or_else(|| ClientError::new(ErrorKind::Other, format!("没有保存账号 {}", username)))?;
                let api = state.hexagon(api_url)?;
                login(&mut state, &api, &account.username, &account.password, false).await?;
            }
        },
        Command::Queue { action } => {
            enter(&state, Route::SelectedCourses)?;
            match action {
                QueueAction::List => {
                    let items = serde_json::to_value(state.queue.items())?;
                    print_json(&items)?;
                }
                QueueAction::Add(args) => {
                    state.queue.add(args.into());
                }
                QueueAction::Remove { id } => {
                    if !state.queue.remove(&id) {
                        println!("抢课列表中没有 {}", id);
                    }
                }
                QueueAction::Clear => state.queue.clear(),
                QueueAction::Submit => {
                    let api = state.hexagon(api_url)?;
                    let session = api.session()?;
                    for item in state.queue.items() {
                        let request = SelectionRequest::for_course(&session, item);
                        match api.select_class(&request).await {
                            Ok(response) => {
                                println!("{}: {}", item.course.course_name, response.message_or("选课成功！"))
                            }
                            Err(err) if err.kind() == ErrorKind::Unauthorized => return Err(err),
                            Err(err) => println!("{}: {}", item.course.course_name, err.message),
                        }
                    }
                }
            }
        }
        Command::Courses(args) => {
            enter(&state, Route::Browse)?;
            let api = state.hexagon(api_url)?;
            let session = api.session()?;
            let query = CourseQuery {
                query_content: args.query,
                teaching_class_type: args.teaching_class_type,
                campus: args.campus,
                is_major: args.is_major,
                ..CourseQuery::new(&session, &args.elective_batch_code)
            };
            print_json(&api.get_courses(&query).await?)?;
        }
        Command::Batches => {
            enter(&state, Route::Browse)?;
            print_json(&state.hexagon(api_url)?.get_batches().await?)?;
        }
        Command::SysParams => {
            enter(&state, Route::Browse)?;
            print_json(&state.hexagon(api_url)?.get_sys_params().await?)?;
        }
        Command::Select(args) => {
            enter(&state, Route::SelectClass)?;
            let api = state.hexagon(api_url)?;
            let request = args.to_request(&api.session()?);
            let response = api.select_class(&request).await?;
            println!("{}", response.message_or("选课成功！"));
        }
        Command::Drop(args) => {
            enter(&state, Route::SelectedCourses)?;
            let api = state.hexagon(api_url)?;
            let request = args.to_request(&api.session()?);
            let response = api.drop_class(&request).await?;
            println!("{}", response.message_or("退课成功！"));
        }
        Command::Grab { action } => {
            enter(&state, Route::SelectClass)?;
            let api = state.hexagon(api_url)?;
            match action {
                GrabAction::Start {
                    selection,
                    rate,
                    email_user,
                    email_auth,
                    email_msg,
                } => {
                    let request = GrabRequest {
                        select_rate: rate,
                        email_user,
                        email_auth,
                        email_msg,
                        ..GrabRequest::new(selection.to_request(&api.session()?))
                    };
                    let task_id = api.start_grab_course(&request).await?;
                    println!("抢课任务已启动: {}", task_id);
                }
                GrabAction::Stop { task_id } => {
                    api.stop_grab_course(&task_id).await?;
                    println!("抢课任务已停止");
                }
                GrabAction::Status { task_id } => {
                    print_json(&api.grab_course_status(&task_id).await?)?;
                }
            }
        }
        Command::Theme { action } => {
            match action {
                ThemeAction::Show => {}
                ThemeAction::Toggle => {
                    state.theme.toggle();
                }
                ThemeAction::Set { mode } => state.theme.set(matches!(mode, ThemeMode::Dark)),
            }
            println!("{}", state.theme.theme());
        }
        Command::Config { action } => match action {
            ConfigAction::Show => println!("apiUrl: {}", state.api_base_url()),
            ConfigAction::SetApiUrl { url } => {
                let url = settings::set_api_base_url(&*state.store, &url)?;
                println!("apiUrl: {}", url);
            }
        },
    }
    Ok(())
}
