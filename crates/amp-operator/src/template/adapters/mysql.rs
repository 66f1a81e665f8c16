use super::{APP_LABEL, GENERATED_SECRET, p};
use crate::{
    component::{
        Capabilities, Component,
        mysql::{self, Mysql, MysqlOptions},
    },
    object::ResourceObject,
    options,
    template::{Parameter, assembler::Adapter},
};

pub const MYSQL_USER: &str = "MYSQL_USER";
pub const MYSQL_PASSWORD: &str = "MYSQL_PASSWORD";
pub const MYSQL_DATABASE: &str = "MYSQL_DATABASE";
pub const MYSQL_ROOT_PASSWORD: &str = "MYSQL_ROOT_PASSWORD";

pub struct MysqlAdapter;

impl Adapter for MysqlAdapter {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::required(MYSQL_USER)
                .with_display_name("MySQL User")
                .with_description(
                    "Username for MySQL user that will be used for accessing the database.",
                )
                .with_value("mysql"),
            Parameter::required(MYSQL_PASSWORD)
                .with_display_name("MySQL Password")
                .with_description("Password for the MySQL user.")
                .generated(GENERATED_SECRET),
            Parameter::required(MYSQL_DATABASE)
                .with_display_name("MySQL Database Name")
                .with_description("Name of the MySQL database accessed.")
                .with_value("system"),
            Parameter::required(MYSQL_ROOT_PASSWORD)
                .with_display_name("MySQL Root password.")
                .with_description("Password for Root user.")
                .generated(GENERATED_SECRET),
        ]
    }

    fn objects(&self) -> Result<Vec<ResourceObject>, options::Error> {
        let options = MysqlOptions::builder()
            .app_label(p(APP_LABEL))
            .database_name(p(MYSQL_DATABASE))
            .user(p(MYSQL_USER))
            .password(p(MYSQL_PASSWORD))
            .root_password(p(MYSQL_ROOT_PASSWORD))
            .database_url(format!(
                "mysql2://root:{}@{}/{}",
                p(MYSQL_ROOT_PASSWORD),
                mysql::SYSTEM_MYSQL,
                p(MYSQL_DATABASE)
            ))
            .build()?;
        Ok(Mysql::new(options).objects())
    }

    fn capabilities(&self) -> Capabilities {
        let mut capabilities = mysql::capabilities();
        capabilities.external_database_parameters.extend(
            [MYSQL_USER, MYSQL_PASSWORD, MYSQL_DATABASE, MYSQL_ROOT_PASSWORD].map(str::to_owned),
        );
        capabilities
    }
}
