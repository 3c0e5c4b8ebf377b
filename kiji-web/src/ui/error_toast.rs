use yew::prelude::*;

#[derive(Clone, PartialEq, Properties)]
pub struct ErrorToastProps {
    /// Errors to display, tagged with the id to dismiss them by
    pub errors: Vec<(u64, String)>,
    pub on_dismiss: Callback<u64>,
}

#[function_component(ErrorToast)]
pub fn error_toast(p: &ErrorToastProps) -> Html {
    html! {
        <div class="float-above toast-container position-fixed bottom-0 end-0 p-3">
            { for p.errors.iter().map(|(id, message)| {
                let id = *id;
                html! {
                    <div class="toast show align-items-center text-bg-danger" role="alert">
                        <div class="d-flex">
                            <div class="toast-body">{ message }</div>
                            <button
                                type="button"
                                class="btn-close btn-close-white me-2 m-auto"
                                aria-label="Dismiss"
                                onclick={ p.on_dismiss.reform(move |_| id) }
                            >
                            </button>
                        </div>
                    </div>
                }
            }) }
        </div>
    }
}
