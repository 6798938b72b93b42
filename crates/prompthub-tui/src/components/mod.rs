pub mod prompt_list;
pub mod request_form;
